// Gitkit - Git-compatible object store
// Copyright (C) 2025 Gitkit Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
// Command modules for the gitkit CLI
pub mod add;
pub mod cat_file;
pub mod commit_tree;
pub mod hash_object;
pub mod init;
pub mod log;
pub mod ls_files;
pub mod ls_tree;
pub mod rev_parse;
pub mod show_ref;
pub mod symbolic_ref;
pub mod tag;
pub mod update_ref;
pub mod write_tree;

pub use add::AddCmd;
pub use cat_file::CatFileCmd;
pub use commit_tree::CommitTreeCmd;
pub use hash_object::HashObjectCmd;
pub use init::InitCmd;
pub use log::LogCmd;
pub use ls_files::LsFilesCmd;
pub use ls_tree::LsTreeCmd;
pub use rev_parse::RevParseCmd;
pub use show_ref::ShowRefCmd;
pub use symbolic_ref::SymbolicRefCmd;
pub use tag::TagCmd;
pub use update_ref::UpdateRefCmd;
pub use write_tree::WriteTreeCmd;

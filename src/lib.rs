pub mod archive;
pub mod cleanup;
pub mod commands;
pub mod descriptor;
pub mod digest;
pub mod download;
pub mod error;
pub mod http;
pub mod inreplace;
pub mod install;
pub mod package;
pub mod runtime;

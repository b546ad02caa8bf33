// Copyright (C) 2024 Ethan Uppal. All rights reserved.

use std::path::PathBuf;

use crate::catalog::Language;

pub const USAGE: &str = "Usage:\nirvm <ir-file> [--en]";

#[derive(Debug, PartialEq, Eq)]
pub struct Args {
    pub path: PathBuf,
    pub language: Language,
}

/// Parses the arguments after the program name. `None` means the usage
/// message should be shown.
pub fn parse<I, S>(args: I) -> Option<Args>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args = args.into_iter().map(Into::into).collect::<Vec<String>>();
    match args.as_slice() {
        [path] => Some(Args {
            path: path.into(),
            language: Language::ZhCn,
        }),
        [path, flag] if flag == "--en" => Some(Args {
            path: path.into(),
            language: Language::En,
        }),
        _ => None,
    }
}

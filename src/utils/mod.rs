pub mod clipboard;
pub mod ids;
#[cfg(test)]
pub mod test_utils;
pub mod text;
pub mod url;

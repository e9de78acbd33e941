//! The fixed set of files fetched by every cycle.

/// Number of files downloaded per cycle.
pub const FILE_COUNT: usize = 10;

/// Names of the files downloaded per cycle, in order. Each name is both the
/// resource path on the origin (`/<name>`) and the destination file name in
/// the scratch directory.
pub static FILES: [&str; FILE_COUNT] = [
    "0.zip", "1.zip", "2.zip", "3.zip", "4.zip", "5.zip", "6.zip", "7.zip", "8.zip", "9.zip",
];

/// Get the file set as owned names, for callers that need to hand it around.
pub fn file_names() -> Vec<String> {
    FILES.iter().map(|name| name.to_string()).collect()
}

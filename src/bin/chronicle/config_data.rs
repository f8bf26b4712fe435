use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;

const CONFIG_SAMPLE: &str = r#"# For the directory locations, If you want it to be relative to the executable directory
# use ${exe_dir}/location
[paths]
posts_dir = "posts"
comments_dir = "comments"

[defaults]
post_extension = "md"
untitled = "N/A"

# Remove the location to use the user cache dir
[log]
level = "Info"
log_to_console = true

# Each new comment is appended to the outbox as one JSON line
[notify]
recipients = []
queue_size = 64
"#;

/// Fails if the file already exists.
pub(crate) fn write_sample_cfg(file_path: &Path) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(file_path)?;
    file.write_all(CONFIG_SAMPLE.as_bytes())
}

use anyhow::anyhow;
use formatx::formatx;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Somewhere for the results of a run to go. Each kind of result (the full record, the monthly
/// table, the completed input) is written under its own location key.
pub trait Output: Debug + Sync + Send {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write>;
    /// Whether this output can be considered a no-op and therefore that any code that only writes to the output can be skipped.
    fn is_noop(&self) -> bool {
        false
    }
}

#[derive(Debug)]
pub struct FileOutput {
    directory_path: PathBuf,
    file_template: String,
}

impl FileOutput {
    /// `file_template` takes the location key then the file extension, e.g. `"house__{}.{}"`.
    pub fn new(directory_path: PathBuf, file_template: String) -> Self {
        Self {
            directory_path,
            file_template,
        }
    }
}

impl Output for FileOutput {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        let file_name = formatx!(&self.file_template, location_key, file_extension)
            .map_err(|error| anyhow!("Could not fill output file template: {error:?}"))?;

        Ok(BufWriter::new(File::create(
            self.directory_path.join(file_name),
        )?))
    }
}

impl Output for &FileOutput {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        <FileOutput as Output>::writer_for_location_key(self, location_key, file_extension)
    }
}

/// An output that goes to nowhere/ a "sink"/ /dev/null.
#[derive(Debug, Default)]
pub struct SinkOutput;

impl Output for SinkOutput {
    fn writer_for_location_key(
        &self,
        _location_key: &str,
        _file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        Ok(io::sink())
    }

    fn is_noop(&self) -> bool {
        true
    }
}

/// Keeps everything written in memory, one buffer per "file", for embedding and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryOutput(Arc<Mutex<Vec<(String, Vec<u8>)>>>);

impl MemoryOutput {
    pub fn new() -> Self {
        Default::default()
    }

    /// Contents written under the given key and extension, if any.
    pub fn contents(&self, location_key: &str, file_extension: &str) -> Option<String> {
        let name = file_name(location_key, file_extension);
        self.0
            .lock()
            .iter()
            .find(|(file, _)| *file == name)
            .map(|(_, bytes)| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn file_names(&self) -> Vec<String> {
        self.0.lock().iter().map(|(file, _)| file.clone()).collect()
    }
}

fn file_name(location_key: &str, file_extension: &str) -> String {
    format!("{location_key}.{file_extension}")
}

impl Output for MemoryOutput {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        let name = file_name(location_key, file_extension);
        {
            let mut files = self.0.lock();
            match files.iter_mut().find(|(file, _)| *file == name) {
                Some((_, bytes)) => bytes.clear(),
                None => files.push((name.clone(), vec![])),
            }
        }

        Ok(MemoryFileWriter {
            files: self.0.clone(),
            name,
        })
    }
}

impl Output for &MemoryOutput {
    fn writer_for_location_key(
        &self,
        location_key: &str,
        file_extension: &str,
    ) -> anyhow::Result<impl Write> {
        <MemoryOutput as Output>::writer_for_location_key(self, location_key, file_extension)
    }
}

/// Writer for one "file" within a `MemoryOutput`.
struct MemoryFileWriter {
    files: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    name: String,
}

impl Write for MemoryFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut files = self.files.lock();
        match files.iter_mut().find(|(file, _)| *file == self.name) {
            Some((_, bytes)) => bytes.extend_from_slice(buf),
            None => files.push((self.name.clone(), buf.to_vec())),
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn should_keep_each_file_separately() {
        let output = MemoryOutput::new();
        write!(output.writer_for_location_key("results", "json").unwrap(), "{{}}").unwrap();
        {
            let mut writer = output.writer_for_location_key("monthly", "csv").unwrap();
            write!(writer, "Month,").unwrap();
            write!(writer, "Losses").unwrap();
        }

        assert_eq!(output.file_names(), vec!["results.json", "monthly.csv"]);
        assert_eq!(output.contents("results", "json").unwrap(), "{}");
        assert_eq!(output.contents("monthly", "csv").unwrap(), "Month,Losses");
        assert_eq!(output.contents("monthly", "json"), None);
    }

    #[rstest]
    fn should_replace_a_file_written_again() {
        let output = MemoryOutput::new();
        write!(output.writer_for_location_key("results", "json").unwrap(), "first").unwrap();
        write!(output.writer_for_location_key("results", "json").unwrap(), "second").unwrap();

        assert_eq!(output.contents("results", "json").unwrap(), "second");
    }

    #[rstest]
    fn should_fill_file_template() {
        let directory = std::env::temp_dir();
        let output = FileOutput::new(directory.clone(), "bem_output_test__{}.{}".to_string());

        write!(output.writer_for_location_key("results", "json").unwrap(), "{{}}").unwrap();

        let path = directory.join("bem_output_test__results.json");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        std::fs::remove_file(path).unwrap();
    }

    #[rstest]
    fn should_be_noop_only_for_sink() {
        assert!(SinkOutput.is_noop());
        assert!(!MemoryOutput::new().is_noop());
    }
}

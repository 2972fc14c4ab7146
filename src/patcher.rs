use crate::error::{IrrSchedError, Result};
use crate::models::FieldUnitContext;
use regex_lite::Regex;
use std::path::{Path, PathBuf};

/// Marker preceding the append region of a management file.
const SCHEDULE_MARKER: &str = "Operation Schedule";
/// Fixed distance from the marker to the insertion offset: the remainder of
/// the marker line in the SWAT header layout.
const MARKER_SKIP: usize = 50;

/// One management file, opened and split at the schedule insertion offset.
///
/// Everything before the offset is preserved byte for byte; the assembled
/// schedule replaces whatever followed it.
#[derive(Debug)]
pub struct MgtFile {
    path: PathBuf,
    head: String,
    pub context: FieldUnitContext,
}

impl MgtFile {
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;

        let context = FieldUnitContext {
            hru: header_tag(&data, r"Watershed HRU:\s*(\d+)", "Watershed HRU", path)?,
            subbasin: header_tag(&data, r"Subbasin:\s*(\d+)", "Subbasin", path)?,
            crop: header_tag(&data, r"Luse:\s*([A-Z]+)", "Luse", path)?,
        };

        let marker = data.find(SCHEDULE_MARKER).ok_or_else(|| missing(
            SCHEDULE_MARKER,
            path,
        ))?;
        let offset = marker + MARKER_SKIP;
        if offset > data.len() || !data.is_char_boundary(offset) {
            return Err(IrrSchedError::InvalidData(format!(
                "schedule marker too close to end of {}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            head: data[..offset].to_string(),
            context,
        })
    }

    /// Rewrite the file as preserved header plus the rendered schedule. The
    /// content is complete before the write, so a failure earlier in the
    /// pipeline never leaves a partial append.
    pub fn write_schedule(&self, schedule: &str) -> Result<()> {
        let mut content = String::with_capacity(self.head.len() + schedule.len());
        content.push_str(&self.head);
        content.push_str(schedule);
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    #[cfg(test)]
    pub fn head(&self) -> &str {
        &self.head
    }
}

fn header_tag<T: std::str::FromStr>(
    data: &str,
    pattern: &str,
    tag: &str,
    path: &Path,
) -> Result<T> {
    // Patterns are fixed at compile time; a failure here is a programmer
    // error, not an input error.
    let re = Regex::new(pattern).map_err(|e| IrrSchedError::InvalidData(e.to_string()))?;
    re.captures(data)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .ok_or_else(|| missing(tag, path))
}

fn missing(tag: &str, path: &Path) -> IrrSchedError {
    IrrSchedError::MissingHeaderTag {
        tag: tag.to_string(),
        path: path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn header(crop: &str) -> String {
        format!(
            " .mgt file Watershed HRU:139 Subbasin:10 HRU:3 Luse:{} written by test\n\
             some intervening header content\n\
             Operation Schedule:{}\n",
            crop,
            " ".repeat(60)
        )
    }

    fn write_file(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("000010001.mgt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn extracts_all_three_header_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), &header("CORN"));
        let mgt = MgtFile::open(&path).unwrap();
        assert_eq!(mgt.context.hru, 139);
        assert_eq!(mgt.context.subbasin, 10);
        assert_eq!(mgt.context.crop, "CORN");
    }

    #[test]
    fn insertion_offset_is_fifty_bytes_past_the_marker() {
        let dir = tempfile::tempdir().unwrap();
        let text = header("SOYB");
        let path = write_file(dir.path(), &text);
        let mgt = MgtFile::open(&path).unwrap();
        let marker = text.find(SCHEDULE_MARKER).unwrap();
        assert_eq!(mgt.head().len(), marker + MARKER_SKIP);
        assert_eq!(mgt.head(), &text[..marker + MARKER_SKIP]);
    }

    #[test]
    fn missing_tag_names_the_tag() {
        let dir = tempfile::tempdir().unwrap();
        let text = header("TOBC").replace("Subbasin:10", "");
        let path = write_file(dir.path(), &text);
        let err = MgtFile::open(&path).unwrap_err();
        match err {
            IrrSchedError::MissingHeaderTag { tag, .. } => assert_eq!(tag, "Subbasin"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn write_replaces_everything_past_the_offset() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!("{}old schedule line\n", header("CORN"));
        let path = write_file(dir.path(), &text);
        let mgt = MgtFile::open(&path).unwrap();
        mgt.write_schedule("                17\n").unwrap();

        let patched = std::fs::read_to_string(&path).unwrap();
        assert!(patched.starts_with(mgt.head()));
        assert!(!patched.contains("old schedule line"));
        assert!(patched.ends_with("                17\n"));
    }

    #[test]
    fn truncated_marker_line_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let text = " Watershed HRU:1 Subbasin:1 Luse:CORN\nOperation Schedule:";
        let path = write_file(dir.path(), text);
        assert!(MgtFile::open(&path).is_err());
    }
}

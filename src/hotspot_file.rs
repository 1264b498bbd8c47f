/*!
 * Loading hotspot detections from disk.
 *
 * Detections are stored as comma separated values, one detection per line:
 *
 * ```text
 * id,latitude,longitude,detected_at,frp,confidence
 * viirs-0001,57.4778,-4.2247,2025-04-20T13:30:00Z,12.5,80
 * ```
 *
 * The header line is optional but must come before the first detection. Blank lines, lines
 * starting with `#` and a leading byte order mark are ignored. A file may also be a zip archive
 * holding exactly one such CSV file.
 */
use crate::{detection::DetectionPoint, HotspotResult};
use chrono::{DateTime, Utc};
use std::{
    fmt::Display,
    fs::File,
    io::{BufRead, BufReader, Cursor, Read},
    path::{Path, PathBuf},
    str::FromStr,
};

const NUM_FIELDS: usize = 6;

/**
 * The detections loaded from a single file.
 */
#[derive(Debug, Clone)]
pub struct HotspotFile {
    /// Where the data was loaded from.
    path: PathBuf,
    /// Just the file name portion of the path.
    fname: String,
    /// Detections in the order they appear in the file.
    points: Vec<DetectionPoint>,
}

impl HotspotFile {
    /// Open a `.csv` file, or a `.zip` file containing a single CSV file.
    pub fn open<P: AsRef<Path>>(path: P) -> HotspotResult<Self> {
        let p: &Path = path.as_ref();
        let fname: String = p
            .file_name()
            .map(|f| f.to_string_lossy().to_string())
            .ok_or_else(|| format!("not a file: {}", p.display()))?;

        let points = match p.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => {
                let f = File::open(p)?;
                parse_detections(BufReader::new(f), &fname)?
            }
            Some("zip") => Self::read_zip(p, &fname)?,
            Some(_) => return Err(std::io::Error::from(std::io::ErrorKind::Unsupported).into()),
            None => return Err(std::io::Error::from(std::io::ErrorKind::InvalidInput).into()),
        };

        log::debug!("loaded {} detections from {}", points.len(), fname);

        Ok(HotspotFile {
            path: p.to_path_buf(),
            fname,
            points,
        })
    }

    /// Parse detections from any reader, `fname` is only used in error messages.
    pub fn from_reader<R: BufRead>(reader: R, fname: &str) -> HotspotResult<Self> {
        let points = parse_detections(reader, fname)?;

        Ok(HotspotFile {
            path: PathBuf::from(fname),
            fname: fname.to_owned(),
            points,
        })
    }

    /// Check if the path looks like something [HotspotFile::open] can read.
    pub fn is_hotspot_file<P: AsRef<Path>>(path: P) -> bool {
        matches!(
            path.as_ref().extension().and_then(|ext| ext.to_str()),
            Some("csv") | Some("zip")
        )
    }

    fn read_zip(p: &Path, fname: &str) -> HotspotResult<Vec<DetectionPoint>> {
        let file = File::open(p)?;
        let mut zip = zip::ZipArchive::new(file)?;

        if zip.len() != 1 {
            return Err(format!(
                "{}: expected an archive with one file, found {}",
                fname,
                zip.len()
            )
            .into());
        }

        let mut csv_file = zip.by_index(0)?;
        let mut buf: Vec<u8> = Vec::with_capacity(csv_file.size() as usize + 10);
        let _size_read = csv_file.read_to_end(&mut buf)?;

        parse_detections(Cursor::new(buf), fname)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.fname
    }

    pub fn points(&self) -> &[DetectionPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn into_points(self) -> Vec<DetectionPoint> {
        self.points
    }
}

fn parse_detections<R: BufRead>(reader: R, fname: &str) -> HotspotResult<Vec<DetectionPoint>> {
    let mut points = vec![];
    let mut seen_record = false;

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_idx + 1;

        let line = line.trim_start_matches('\u{feff}').trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != NUM_FIELDS {
            return Err(format!(
                "{}:{}: expected {} fields, found {}",
                fname,
                line_no,
                NUM_FIELDS,
                fields.len()
            )
            .into());
        }

        // Only the first record may be a header.
        let is_header = !seen_record && fields[0].eq_ignore_ascii_case("id");
        seen_record = true;
        if is_header {
            continue;
        }

        let lat: f64 = parse_field(fields[1], "latitude", fname, line_no)?;
        let lon: f64 = parse_field(fields[2], "longitude", fname, line_no)?;
        let detected_at = DateTime::parse_from_rfc3339(fields[3])
            .map_err(|err| {
                format!(
                    "{}:{}: bad detected_at '{}': {}",
                    fname, line_no, fields[3], err
                )
            })?
            .with_timezone(&Utc);
        let frp: f64 = parse_field(fields[4], "frp", fname, line_no)?;
        let confidence: f64 = parse_field(fields[5], "confidence", fname, line_no)?;

        points.push(DetectionPoint::new(
            fields[0],
            lat,
            lon,
            detected_at,
            frp,
            confidence,
        ));
    }

    Ok(points)
}

fn parse_field<T>(field: &str, name: &str, fname: &str, line_no: usize) -> HotspotResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    field.parse().map_err(|err: T::Err| {
        format!("{}:{}: bad {} '{}': {}", fname, line_no, name, field, err).into()
    })
}

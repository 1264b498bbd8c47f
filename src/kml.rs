//! Very simple functions for producing KML files specifically suited to this crate and the programs
//! that use it.
//!
//! This is not a general solution at all, only the parts needed to put clusters on a map with a
//! streaming type API. That means the user is responsible for closing all tags.

use crate::HotspotResult;
use chrono::{DateTime, Utc};
use std::{
    borrow::Cow,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

/// A plain KML document on disk.
///
/// Call [KmlFile::finish] to close the document and see any write errors. If it is only dropped
/// the document is still closed, but errors are only logged.
pub struct KmlFile {
    out: BufWriter<File>,
    finished: bool,
}

impl KmlFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> HotspotResult<Self> {
        let f = File::create(pth.as_ref())?;
        let mut new = KmlFile {
            out: BufWriter::new(f),
            finished: false,
        };
        new.start_document()?;
        Ok(new)
    }

    /// Close the document and flush it to disk.
    pub fn finish(mut self) -> HotspotResult<()> {
        self.finished = true;
        self.finish_document()?;
        self.out.flush()?;
        Ok(())
    }
}

impl KmlWriter for KmlFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.out
    }
}

impl Drop for KmlFile {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(err) = self.finish_document() {
                log::error!("error closing kml file: {}", err);
            }
        }
    }
}

/// A KML document compressed into a KMZ archive.
///
/// Like [KmlFile], call [KmzFile::finish] to learn whether the archive was written completely.
pub struct KmzFile {
    zip: ZipWriter<File>,
    finished: bool,
}

impl KmzFile {
    pub fn new<P: AsRef<Path>>(pth: P) -> HotspotResult<Self> {
        let f = File::create(pth.as_ref())?;
        let mut zip = ZipWriter::new(f);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file("doc.kml", options)?;

        let mut new = KmzFile {
            zip,
            finished: false,
        };
        new.start_document()?;
        Ok(new)
    }

    /// Close the document and write the archive's central directory.
    pub fn finish(mut self) -> HotspotResult<()> {
        self.finished = true;
        self.finish_document()?;
        let mut f = self.zip.finish()?;
        f.flush()?;
        Ok(())
    }
}

impl KmlWriter for KmzFile {
    fn output(&mut self) -> &mut dyn Write {
        &mut self.zip
    }
}

impl Drop for KmzFile {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        if let Err(err) = self.finish_document() {
            log::error!("error closing kml document in kmz archive: {}", err);
        }
        if let Err(err) = self.zip.finish() {
            log::error!("error closing kmz archive: {}", err);
        }
    }
}

/// Replace the characters that are not allowed to appear literally in XML text or attributes.
pub(crate) fn escape(text: &str) -> Cow<str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }

    Cow::Owned(escaped)
}

/// Streaming output of KML elements.
///
/// Text handed to these functions is escaped, except descriptions which go out as CDATA.
pub trait KmlWriter {
    fn output(&mut self) -> &mut dyn Write;

    /// Start by putting the header out.
    fn start_document(&mut self) -> HotspotResult<()> {
        const HEADER: &str = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<kml xmlns="http://www.opengis.net/kml/2.2">"#,
            "\n",
            "<Document>\n"
        );

        self.output().write_all(HEADER.as_bytes())?;

        Ok(())
    }

    /// Close a document.
    fn finish_document(&mut self) -> HotspotResult<()> {
        const FOOTER: &str = concat!(r#"</Document>"#, "\n", r#"</kml>"#, "\n");
        self.output().write_all(FOOTER.as_bytes())?;
        Ok(())
    }

    /// Write a simple element holding only text.
    fn text_element(&mut self, tag: &str, text: &str) -> HotspotResult<()> {
        writeln!(self.output(), "<{tag}>{}</{tag}>", escape(text), tag = tag)?;
        Ok(())
    }

    /// Write a description element to the file.
    fn write_description(&mut self, description: &str) -> HotspotResult<()> {
        writeln!(
            self.output(),
            "<description><![CDATA[{}]]></description>",
            description
        )?;
        Ok(())
    }

    /// Start a KML folder.
    fn start_folder(&mut self, name: Option<&str>, is_open: bool) -> HotspotResult<()> {
        self.output().write_all("<Folder>\n".as_bytes())?;

        if let Some(name) = name {
            self.text_element("name", name)?;
        }

        if is_open {
            self.output().write_all("<open>1</open>\n".as_bytes())?;
        }

        Ok(())
    }

    /// Close out a folder element
    fn finish_folder(&mut self) -> HotspotResult<()> {
        writeln!(self.output(), "</Folder>")?;
        Ok(())
    }

    /// Start a placemark element.
    fn start_placemark(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        style_url: Option<&str>,
    ) -> HotspotResult<()> {
        writeln!(self.output(), "<Placemark>")?;

        if let Some(name) = name {
            self.text_element("name", name)?;
        }

        if let Some(description) = description {
            self.write_description(description)?;
        }

        if let Some(style_url) = style_url {
            self.text_element("styleUrl", style_url)?;
        }

        Ok(())
    }

    /// Close out a placemark element.
    fn finish_placemark(&mut self) -> HotspotResult<()> {
        writeln!(self.output(), "</Placemark>")?;
        Ok(())
    }

    /// Start a style definition.
    fn start_style(&mut self, style_id: Option<&str>) -> HotspotResult<()> {
        if let Some(style_id) = style_id {
            writeln!(self.output(), "<Style id=\"{}\">", escape(style_id))?;
        } else {
            writeln!(self.output(), "<Style>")?;
        }
        Ok(())
    }

    /// Close out a style definition.
    fn finish_style(&mut self) -> HotspotResult<()> {
        writeln!(self.output(), "</Style>")?;
        Ok(())
    }

    /// Create an IconStyle element.
    fn create_icon_style(&mut self, icon_url: Option<&str>, scale: f64) -> HotspotResult<()> {
        writeln!(self.output(), "<IconStyle>")?;

        if scale > 0.0 {
            writeln!(self.output(), "<scale>{}</scale>", scale)?;
        } else {
            writeln!(self.output(), "<scale>1</scale>")?;
        }

        if let Some(icon_url) = icon_url {
            writeln!(self.output(), "<Icon><href>{}</href></Icon>", escape(icon_url))?;
        }

        writeln!(self.output(), "</IconStyle>")?;
        Ok(())
    }

    /// Write out a TimeSpan element.
    fn timespan(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> HotspotResult<()> {
        self.output().write_all("<TimeSpan>\n".as_bytes())?;
        writeln!(
            self.output(),
            "<begin>{}</begin>",
            start.format("%Y-%m-%dT%H:%M:%S.000Z")
        )?;
        writeln!(
            self.output(),
            "<end>{}</end>",
            end.format("%Y-%m-%dT%H:%M:%S.000Z")
        )?;
        self.output().write_all("</TimeSpan>\n".as_bytes())?;
        Ok(())
    }

    /// Write out a KML Point element
    fn create_point(&mut self, lat: f64, lon: f64, z: f64) -> HotspotResult<()> {
        writeln!(
            self.output(),
            "<Point>\n<coordinates>{},{},{}</coordinates>\n</Point>",
            lon,
            lat,
            z
        )?;
        Ok(())
    }
}

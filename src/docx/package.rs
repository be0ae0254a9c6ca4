//! OPC package access: locate the main document part, replace it, and copy
//! every other part as stored.

use crate::error::{Error, Result};
use quick_xml::events::Event;
use quick_xml::{Reader, XmlVersion};
use std::fmt;
use std::io::{Cursor, Read, Seek, Write};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

/// A `.docx` package held in memory.
#[derive(Clone)]
pub(crate) struct Package {
    data: Vec<u8>,
    main_part: String,
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("main_part", &self.main_part)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl Package {
    /// Open a package and find its main document part.
    pub(crate) fn from_bytes(data: &[u8]) -> Result<Self> {
        if !super::is_docx(data) {
            return Err(Error::Template("not a ZIP-based Word document".to_string()));
        }
        let mut archive = ZipArchive::new(Cursor::new(data)).map_err(template_error)?;
        let main_part = match read_entry(&mut archive, PACKAGE_RELS)? {
            Some(rels) => main_part_from_rels(&rels)?,
            None => None,
        }
        .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        log::debug!("Main document part is {}", main_part);
        Ok(Self {
            data: data.to_vec(),
            main_part,
        })
    }

    /// The main document XML.
    pub(crate) fn main_xml(&self) -> Result<String> {
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice())).map_err(template_error)?;
        read_entry(&mut archive, &self.main_part)?
            .ok_or_else(|| Error::Template(format!("package has no {}", self.main_part)))
    }

    /// Repackage with a new main document XML; other parts are copied as stored.
    pub(crate) fn with_main_xml(&self, xml: &str) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(self.data.as_slice())).map_err(docx_error)?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(self.data.len())));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for index in 0..archive.len() {
            let name = archive
                .by_index_raw(index)
                .map_err(docx_error)?
                .name()
                .to_string();
            if name == self.main_part {
                writer.start_file(name, options).map_err(docx_error)?;
                writer.write_all(xml.as_bytes())?;
            } else {
                let entry = archive.by_index_raw(index).map_err(docx_error)?;
                writer.raw_copy_file(entry).map_err(docx_error)?;
            }
        }

        let cursor = writer.finish().map_err(docx_error)?;
        Ok(cursor.into_inner())
    }
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(template_error(e)),
    };
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| Error::Template(format!("{}: {}", name, e)))?;
    Ok(Some(xml))
}

/// Target of the package-level `officeDocument` relationship.
fn main_part_from_rels(rels: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(rels);
    loop {
        match reader.read_event().map_err(template_error)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut kind = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(template_error)?;
                    let value = attr
                        .normalized_value(XmlVersion::Implicit1_0)
                        .map_err(template_error)?;
                    match attr.key.as_ref() {
                        b"Type" => kind = Some(value.into_owned()),
                        b"Target" => target = Some(value.into_owned()),
                        _ => {}
                    }
                }
                if kind.is_some_and(|k| k.ends_with(OFFICE_DOCUMENT_REL)) {
                    return Ok(target.map(|t| t.trim_start_matches('/').to_string()));
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

fn template_error(err: impl fmt::Display) -> Error {
    Error::Template(err.to_string())
}

fn docx_error(err: impl fmt::Display) -> Error {
    Error::Docx(err.to_string())
}

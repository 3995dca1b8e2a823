//! The transcript document: original text plus every produced translation,
//! rendered as a Word (DOCX) file.

use crate::error::{AutodubError, Result};
use crate::language;
use crate::transcribe::Transcript;
use crate::translate::Translation;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Archive member name of the document.
pub const DOCUMENT_FILE_NAME: &str = "translations.docx";

pub const DOCUMENT_TITLE: &str = "Translations";
pub const ORIGINAL_HEADING: &str = "Original Text:";

/// Font with coverage for the Indic scripts in the recognized language set.
const BODY_FONT: &str = "Nirmala UI";
/// 12 pt, in half-points.
const BODY_SIZE: u32 = 24;

/// One heading plus body. `language` is `None` for the original transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSection {
    pub language: Option<String>,
    pub heading: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptDocument {
    pub title: String,
    pub sections: Vec<DocumentSection>,
}

impl TranscriptDocument {
    /// Original transcript first, then one section per translation in the
    /// order given.
    pub fn build(transcript: &Transcript, translations: &[Translation]) -> Self {
        let mut sections = Vec::with_capacity(translations.len() + 1);
        sections.push(DocumentSection {
            language: None,
            heading: ORIGINAL_HEADING.to_string(),
            body: transcript.text().to_string(),
        });

        for translation in translations {
            sections.push(DocumentSection {
                language: Some(translation.language.clone()),
                heading: format!("Translation in {}:", language::label(&translation.language)),
                body: translation.text.clone(),
            });
        }

        Self {
            title: DOCUMENT_TITLE.to_string(),
            sections,
        }
    }

    /// Languages with a translation section, in document order.
    pub fn languages(&self) -> Vec<&str> {
        self.sections
            .iter()
            .filter_map(|s| s.language.as_deref())
            .collect()
    }

    /// Render as an Office Open XML word-processing package.
    pub fn to_docx(&self) -> Result<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let parts: [(&str, String); 5] = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("_rels/.rels", PACKAGE_RELS.to_string()),
            ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
            ("word/styles.xml", STYLES.to_string()),
            ("word/document.xml", self.document_xml()),
        ];

        for (name, content) in parts {
            writer
                .start_file(name, options)
                .map_err(|e| AutodubError::Document(format!("Failed to add {name}: {e}")))?;
            writer.write_all(content.as_bytes())?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| AutodubError::Document(format!("Failed to finish document: {e}")))?;
        Ok(cursor.into_inner())
    }

    fn document_xml(&self) -> String {
        let mut body = String::new();
        body.push_str(&heading_paragraph("Heading1", &self.title));
        for section in &self.sections {
            body.push_str(&heading_paragraph("Heading2", &section.heading));
            body.push_str(&body_paragraph(&section.body));
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#
        )
    }
}

fn heading_paragraph(style: &str, text: &str) -> String {
    format!(
        r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
        escape_xml(text)
    )
}

fn body_paragraph(text: &str) -> String {
    let run_props = format!(
        r#"<w:rPr><w:rFonts w:ascii="{BODY_FONT}" w:hAnsi="{BODY_FONT}" w:cs="{BODY_FONT}"/><w:sz w:val="{BODY_SIZE}"/><w:szCs w:val="{BODY_SIZE}"/></w:rPr>"#
    );

    let content = text
        .lines()
        .map(|line| format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape_xml(line)))
        .collect::<Vec<_>>()
        .join("<w:br/>");

    format!("<w:p><w:r>{run_props}{content}</w:r></w:p>")
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // Control characters are not allowed in XML 1.0.
            c if c.is_control() && c != '\t' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="480" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style></w:styles>"#;

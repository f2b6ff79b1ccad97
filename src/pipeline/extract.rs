//! HTML field extraction for a patent landing page.
//!
//! Extraction never fails: a missing element yields the schema default for
//! its field (see [`crate::record::METADATA_SCHEMA`]). The only thing this
//! stage decides beyond the record is where the PDF lives.

use crate::record::{Field, FieldValue, MetadataRecord};
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

static SEL_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"span[itemprop="title"]"#).unwrap());
static SEL_ABSTRACT: Lazy<Selector> = Lazy::new(|| Selector::parse("div.abstract").unwrap());
static SEL_INVENTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[itemprop="inventor"]"#).unwrap());
static SEL_FILING_DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"time[itemprop="filingDate"]"#).unwrap());
static SEL_PUBLICATION_DATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"time[itemprop="publicationDate"]"#).unwrap());
static SEL_PDF_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[href$=".pdf"]"#).unwrap());

/// What a landing page yields.
#[derive(Debug, Clone)]
pub struct PatentPage {
    pub record: MetadataRecord,
    /// Linked PDF, or the fallback storage location when the page has none.
    pub pdf_url: Url,
}

/// Extract the record and PDF location from a landing page.
///
/// `pdf_fallback` is used verbatim when the page has no `.pdf` link.
pub fn extract_page(html: &str, id: &str, page_url: &Url, pdf_fallback: Url) -> PatentPage {
    let doc = Html::parse_document(html);

    let record = MetadataRecord::from_fields(id, |_, spec| match spec.field {
        Field::PatentNumber => Some(FieldValue::Text(id.to_string())),
        Field::Title => first_text(&doc, &SEL_TITLE),
        Field::FilingDate => first_text(&doc, &SEL_FILING_DATE),
        Field::PublicationDate => first_text(&doc, &SEL_PUBLICATION_DATE),
        Field::Abstract => first_text(&doc, &SEL_ABSTRACT),
        Field::Inventors => Some(FieldValue::List(
            doc.select(&SEL_INVENTOR)
                .map(element_text)
                .filter(|name| !name.is_empty())
                .collect(),
        )),
    });

    let pdf_url = doc
        .select(&SEL_PDF_LINK)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| page_url.join(href).ok())
        .unwrap_or_else(|| {
            debug!("{}: no PDF link on page, using {}", id, pdf_fallback);
            pdf_fallback
        });

    PatentPage { record, pdf_url }
}

fn first_text(doc: &Html, selector: &Selector) -> Option<FieldValue> {
    doc.select(selector)
        .next()
        .map(|el| FieldValue::Text(element_text(el)))
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NOT_AVAILABLE;

    const PAGE: &str = r#"<html><body>
        <span itemprop="title">  Widget assembly
        </span>
        <time itemprop="filingDate">2019-03-04</time>
        <time itemprop="publicationDate">2021-06-01</time>
        <dd itemprop="inventor">Ada Lovelace</dd>
        <dd itemprop="inventor">Charles Babbage</dd>
        <div class="abstract">A widget with <b>two</b> parts.</div>
        <a href="https://patentimages.example/pdfs/US1234567B2.pdf">Download PDF</a>
    </body></html>"#;

    fn page_url() -> Url {
        Url::parse("https://patents.example/patent/US1234567B2").unwrap()
    }

    fn fallback() -> Url {
        Url::parse("https://storage.example/pdfs/US1234567B2.pdf").unwrap()
    }

    #[test]
    fn extracts_every_field() {
        let page = extract_page(PAGE, "US1234567B2", &page_url(), fallback());
        let r = page.record;
        assert_eq!(r.patent_number, "US1234567B2");
        assert_eq!(r.title, "Widget assembly");
        assert_eq!(r.filing_date, "2019-03-04");
        assert_eq!(r.publication_date, "2021-06-01");
        assert_eq!(r.inventors, vec!["Ada Lovelace", "Charles Babbage"]);
        assert_eq!(r.abstract_text, "A widget with two parts.");
        assert_eq!(
            page.pdf_url.as_str(),
            "https://patentimages.example/pdfs/US1234567B2.pdf"
        );
    }

    #[test]
    fn missing_elements_take_defaults() {
        let page = extract_page("<html><body></body></html>", "EP1", &page_url(), fallback());
        assert_eq!(page.record.title, NOT_AVAILABLE);
        assert_eq!(page.record.abstract_text, NOT_AVAILABLE);
        assert_eq!(page.record.filing_date, NOT_AVAILABLE);
        assert!(page.record.inventors.is_empty());
        assert_eq!(page.pdf_url, fallback());
    }

    #[test]
    fn wrapped_header_text_is_joined() {
        let html = r#"<span itemprop="title">Widget
                assembly</span>
            <dd itemprop="inventor">Ada
                Lovelace</dd>
            <div class="abstract">First line.
Second line.</div>"#;
        let r = extract_page(html, "US1", &page_url(), fallback()).record;
        assert_eq!(r.title, "Widget assembly");
        assert_eq!(r.inventors, vec!["Ada Lovelace"]);
        assert_eq!(r.abstract_text, "First line.\nSecond line.");
    }

    #[test]
    fn relative_pdf_link_is_joined_to_page() {
        let html = r#"<a href="/pdfs/US1.pdf">pdf</a>"#;
        let page = extract_page(html, "US1", &page_url(), fallback());
        assert_eq!(page.pdf_url.as_str(), "https://patents.example/pdfs/US1.pdf");
    }
}

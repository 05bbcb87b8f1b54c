// src/feed/parser.rs

//! Reads a state forecast product (`IDx?????.xml`) into a typed tree.
//!
//! The reader is event driven and best effort: when the document is
//! malformed, everything read before the fault is kept and the fault is
//! reported alongside it. Only the element paths used downstream are
//! extracted:
//!
//! ```text
//! product
//! ├── amoc/issue-time-local, amoc/issue-time-utc
//! └── forecast
//!     └── area[@aac @description @type @parent-aac]
//!         └── forecast-period[@index @start-time-local @end-time-local
//!                             @start-time-utc @end-time-utc]
//!             ├── element[@type @units]  (text value)
//!             └── text[@type]            (text value)
//! ```

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Parsed product document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductDocument {
    pub issue_time_local: String,
    pub issue_time_utc: String,
    pub areas: Vec<Area>,
}

/// A forecast area (region, district, metropolitan or location).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Area {
    pub aac: String,
    pub description: String,
    pub area_type: String,
    pub parent_aac: String,
    pub periods: Vec<ForecastPeriod>,
}

/// One time slot of an area's forecast. Timestamps are left unparsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastPeriod {
    pub index: String,
    pub start_time_local: String,
    pub end_time_local: String,
    pub start_time_utc: String,
    pub end_time_utc: String,
    pub elements: Vec<Element>,
    pub texts: Vec<Text>,
}

/// Typed numeric value, e.g. `air_temperature_minimum`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub kind: String,
    pub units: String,
    pub value: String,
}

/// Typed free text, e.g. `precis`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    pub kind: String,
    pub value: String,
}

/// Result of reading a product: the tree, plus the fault that stopped reading early.
#[derive(Debug)]
pub struct ParsedProduct {
    pub document: ProductDocument,
    pub error: Option<quick_xml::Error>,
}

/// Parse raw product bytes, logging and tolerating malformed XML.
pub fn parse_product(bytes: &[u8]) -> ProductDocument {
    let parsed = read_product(bytes);
    if let Some(error) = &parsed.error {
        log::warn!(
            "Product XML is malformed, keeping {} area(s) read so far: {}",
            parsed.document.areas.len(),
            error
        );
    }
    parsed.document
}

/// Parse raw product bytes, returning whatever was read before any fault.
pub fn read_product(bytes: &[u8]) -> ParsedProduct {
    let mut document = ProductDocument::default();
    let error = read_into(bytes, &mut document).err();
    ParsedProduct { document, error }
}

fn read_into(bytes: &[u8], doc: &mut ProductDocument) -> Result<(), quick_xml::Error> {
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                open(doc, &path, &e)?;
                path.push(e.name().as_ref().to_vec());
            }
            Event::Empty(e) => open(doc, &path, &e)?,
            Event::Text(t) => {
                let text = t.unescape()?;
                append_text(doc, &path, &text);
            }
            Event::CData(c) => {
                let raw = c.into_inner();
                append_text(doc, &path, &String::from_utf8_lossy(&raw));
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

/// Record a newly opened element if it is one we extract.
fn open(doc: &mut ProductDocument, path: &[Vec<u8>], e: &BytesStart<'_>) -> Result<(), quick_xml::Error> {
    let parent = path.last().map(Vec::as_slice);

    match (parent, e.name().as_ref()) {
        (Some(b"forecast"), b"area") => {
            let mut area = Area::default();
            for attr in e.attributes() {
                let attr = attr?;
                let value = attr.unescape_value()?.into_owned();
                match attr.key.as_ref() {
                    b"aac" => area.aac = value,
                    b"description" => area.description = value,
                    b"type" => area.area_type = value,
                    b"parent-aac" => area.parent_aac = value,
                    _ => {}
                }
            }
            doc.areas.push(area);
        }
        (Some(b"area"), b"forecast-period") => {
            let mut period = ForecastPeriod::default();
            for attr in e.attributes() {
                let attr = attr?;
                let value = attr.unescape_value()?.into_owned();
                match attr.key.as_ref() {
                    b"index" => period.index = value,
                    b"start-time-local" => period.start_time_local = value,
                    b"end-time-local" => period.end_time_local = value,
                    b"start-time-utc" => period.start_time_utc = value,
                    b"end-time-utc" => period.end_time_utc = value,
                    _ => {}
                }
            }
            if let Some(area) = doc.areas.last_mut() {
                area.periods.push(period);
            }
        }
        (Some(b"forecast-period"), b"element") => {
            let mut element = Element::default();
            for attr in e.attributes() {
                let attr = attr?;
                let value = attr.unescape_value()?.into_owned();
                match attr.key.as_ref() {
                    b"type" => element.kind = value,
                    b"units" => element.units = value,
                    _ => {}
                }
            }
            if let Some(period) = current_period(doc) {
                period.elements.push(element);
            }
        }
        (Some(b"forecast-period"), b"text") => {
            let mut text = Text::default();
            for attr in e.attributes() {
                let attr = attr?;
                if attr.key.as_ref() == b"type" {
                    text.kind = attr.unescape_value()?.into_owned();
                }
            }
            if let Some(period) = current_period(doc) {
                period.texts.push(text);
            }
        }
        _ => {}
    }

    Ok(())
}

/// Route character data to the field of the innermost open element.
fn append_text(doc: &mut ProductDocument, path: &[Vec<u8>], text: &str) {
    let (Some(current), Some(parent)) = (path.last(), path.len().checked_sub(2).map(|i| &path[i]))
    else {
        return;
    };

    match (parent.as_slice(), current.as_slice()) {
        (b"amoc", b"issue-time-local") => doc.issue_time_local.push_str(text),
        (b"amoc", b"issue-time-utc") => doc.issue_time_utc.push_str(text),
        (b"forecast-period", b"element") => {
            if let Some(element) = current_period(doc).and_then(|p| p.elements.last_mut()) {
                element.value.push_str(text);
            }
        }
        (b"forecast-period", b"text") => {
            if let Some(text_node) = current_period(doc).and_then(|p| p.texts.last_mut()) {
                text_node.value.push_str(text);
            }
        }
        _ => {}
    }
}

fn current_period(doc: &mut ProductDocument) -> Option<&mut ForecastPeriod> {
    doc.areas.last_mut().and_then(|a| a.periods.last_mut())
}

#[cfg(test)]
pub(crate) const SAMPLE_PRODUCT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<product xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" version="1.7">
  <amoc>
    <source>
      <sender>Australian Government Bureau of Meteorology</sender>
    </source>
    <identifier>IDN11060</identifier>
    <issue-time-utc>2023-05-31T05:40:00Z</issue-time-utc>
    <issue-time-local tz="EST">2023-05-31T15:40:00+10:00</issue-time-local>
  </amoc>
  <forecast>
    <area aac="NSW_FA001" description="New South Wales" type="region">
      <forecast-period start-time-local="2023-05-31T16:00:00+10:00" end-time-local="2023-06-01T00:00:00+10:00" start-time-utc="2023-05-31T06:00:00Z" end-time-utc="2023-05-31T14:00:00Z" index="0">
        <text type="synoptic_situation">A high over the Bight.</text>
      </forecast-period>
    </area>
    <area aac="NSW_PT131" description="Sydney" type="location" parent-aac="NSW_PW012">
      <forecast-period start-time-local="2023-06-01T00:00:00+10:00" end-time-local="2023-06-02T00:00:00+10:00" start-time-utc="2023-05-31T14:00:00Z" end-time-utc="2023-06-01T14:00:00Z" index="1">
        <element type="forecast_icon_code">1</element>
        <element type="air_temperature_minimum" units="Celsius">10</element>
        <element type="air_temperature_maximum" units="Celsius">20</element>
        <text type="precis">Sunny</text>
        <text type="probability_of_precipitation">20%</text>
      </forecast-period>
      <forecast-period start-time-local="2023-06-02T00:00:00+10:00" end-time-local="2023-06-03T00:00:00+10:00" start-time-utc="2023-06-01T14:00:00Z" end-time-utc="2023-06-02T14:00:00Z" index="2">
        <element type="air_temperature_minimum" units="Celsius">11</element>
        <text type="precis">Shower or two &amp; wind.</text>
      </forecast-period>
    </area>
  </forecast>
</product>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_issue_times_and_areas() {
        let doc = parse_product(SAMPLE_PRODUCT.as_bytes());

        assert_eq!(doc.issue_time_utc, "2023-05-31T05:40:00Z");
        assert_eq!(doc.issue_time_local, "2023-05-31T15:40:00+10:00");
        assert_eq!(doc.areas.len(), 2);
        assert_eq!(doc.areas[0].area_type, "region");
        assert_eq!(doc.areas[1].description, "Sydney");
        assert_eq!(doc.areas[1].parent_aac, "NSW_PW012");
    }

    #[test]
    fn test_reads_periods_elements_and_texts() {
        let doc = parse_product(SAMPLE_PRODUCT.as_bytes());
        let sydney = &doc.areas[1];

        assert_eq!(sydney.periods.len(), 2);
        let first = &sydney.periods[0];
        assert_eq!(first.index, "1");
        assert_eq!(first.start_time_local, "2023-06-01T00:00:00+10:00");
        assert_eq!(first.end_time_utc, "2023-06-01T14:00:00Z");
        assert_eq!(first.elements.len(), 3);
        assert_eq!(
            first.elements[1],
            Element {
                kind: "air_temperature_minimum".into(),
                units: "Celsius".into(),
                value: "10".into(),
            }
        );
        assert_eq!(first.texts[1].kind, "probability_of_precipitation");
        assert_eq!(first.texts[1].value, "20%");

        assert_eq!(sydney.periods[1].texts[0].value, "Shower or two & wind.");
    }

    #[test]
    fn test_malformed_document_keeps_partial_tree() {
        let truncated = r#"<product><forecast>
            <area aac="A" description="Sydney" type="location">
              <forecast-period start-time-local="2023-06-01T00:00:00+10:00">
                <element type="air_temperature_minimum">10</element>
              </forecast-period>
            </area>
            <area aac="B" description="Broken" type="location">
              <forecast-period start-time-local="2023-06-01T00:00:00+10:00">
                <element type="air_temperature_minimum">5</wrong>"#;

        let parsed = read_product(truncated.as_bytes());
        assert!(parsed.error.is_some());
        assert_eq!(parsed.document.areas.len(), 2);
        assert_eq!(parsed.document.areas[0].periods[0].elements[0].value, "10");
    }

    #[test]
    fn test_garbage_yields_empty_document() {
        let doc = parse_product(b"not xml at all");
        assert!(doc.areas.is_empty());
    }

    #[test]
    fn test_areas_outside_forecast_are_ignored() {
        let xml = r#"<product><warnings><area description="Elsewhere" type="location"/></warnings></product>"#;
        let doc = parse_product(xml.as_bytes());
        assert!(doc.areas.is_empty());
    }
}

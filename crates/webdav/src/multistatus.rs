//! PROPFIND multistatus parsing
//!
//! Only the parts the transfer manager needs are extracted: each response's
//! href and whether it is a collection. Element names are matched by local
//! name so any namespace prefix the server picks works.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::DavError;

/// Request body asking only for the resource type
pub const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
  <D:prop>
    <D:resourcetype/>
  </D:prop>
</D:propfind>"#;

/// One entry of a folder listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResource {
    /// Href as reported by the server (path or absolute URL, encoded)
    pub href: String,
    pub is_collection: bool,
}

impl DavResource {
    /// Last path segment, percent-decoded
    pub fn name(&self) -> String {
        let segment = self
            .href
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();

        urlencoding::decode(segment)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| segment.to_string())
    }
}

#[derive(Default)]
struct PendingResponse {
    href: String,
    is_collection: bool,
}

/// Parse a 207 Multi-Status body
pub fn parse_multistatus(xml: &str) -> Result<Vec<DavResource>, DavError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut resources = Vec::new();
    let mut current: Option<PendingResponse> = None;
    let mut in_href = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"response" => current = Some(PendingResponse::default()),
                b"href" => in_href = current.is_some(),
                b"collection" => {
                    if let Some(pending) = current.as_mut() {
                        pending.is_collection = true;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"collection"
                    && let Some(pending) = current.as_mut()
                {
                    pending.is_collection = true;
                }
            }
            Ok(Event::Text(text)) => {
                if in_href && let Some(pending) = current.as_mut() {
                    let text = text.unescape().map_err(|e| DavError::Xml(e.to_string()))?;
                    pending.href.push_str(&text);
                }
            }
            Ok(Event::CData(data)) => {
                if in_href && let Some(pending) = current.as_mut() {
                    pending.href.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"href" => in_href = false,
                b"response" => {
                    if let Some(pending) = current.take() {
                        if pending.href.is_empty() {
                            return Err(DavError::Xml("response without href".to_string()));
                        }
                        resources.push(DavResource {
                            href: pending.href.trim().to_string(),
                            is_collection: pending.is_collection,
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(DavError::Xml(format!(
                    "at position {}: {e}",
                    reader.buffer_position()
                )));
            }
            _ => {}
        }
    }

    if current.is_some() {
        return Err(DavError::Xml("unterminated response element".to_string()));
    }

    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:">
  <d:response>
    <d:href>/dav/repo/multichunks/</d:href>
    <d:propstat>
      <d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/repo/multichunks/multichunk-0a1b</d:href>
    <d:propstat>
      <d:prop><d:resourcetype/></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/dav/repo/multichunks/with%20space</d:href>
    <d:propstat>
      <d:prop><d:resourcetype></d:resourcetype></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn test_parse_listing() {
        let resources = parse_multistatus(LISTING).unwrap();

        assert_eq!(resources.len(), 3);
        assert!(resources[0].is_collection);
        assert_eq!(resources[0].name(), "multichunks");
        assert_eq!(resources[1].href, "/dav/repo/multichunks/multichunk-0a1b");
        assert!(!resources[1].is_collection);
        assert_eq!(resources[2].name(), "with space");
    }

    #[test]
    fn test_parse_other_prefix_and_absolute_hrefs() {
        let xml = r#"<multistatus xmlns="DAV:">
            <response>
              <href>https://host/dav/repo/</href>
              <propstat><prop><resourcetype><collection></collection></resourcetype></prop></propstat>
            </response>
            <response>
              <href>https://host/dav/repo/syncany</href>
            </response>
          </multistatus>"#;
        let resources = parse_multistatus(xml).unwrap();

        assert_eq!(resources.len(), 2);
        assert!(resources[0].is_collection);
        assert_eq!(resources[1].name(), "syncany");
    }

    #[test]
    fn test_escaped_href() {
        let xml = r#"<D:multistatus xmlns:D="DAV:"><D:response><D:href>/a/b&amp;c</D:href></D:response></D:multistatus>"#;
        let resources = parse_multistatus(xml).unwrap();
        assert_eq!(resources[0].name(), "b&c");
    }

    #[test]
    fn test_empty_multistatus() {
        let xml = r#"<D:multistatus xmlns:D="DAV:"></D:multistatus>"#;
        assert!(parse_multistatus(xml).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_multistatus("<D:multistatus><D:response>").is_err());
        assert!(
            parse_multistatus(r#"<D:multistatus xmlns:D="DAV:"><D:response></D:response></D:multistatus>"#)
                .is_err()
        );
    }
}

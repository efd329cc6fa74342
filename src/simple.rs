//! A lightweight, browser-less engine that fetches HTML and estimates how it
//! renders.
//!
//! This engine performs an HTTP GET, parses the HTML, fetches linked
//! stylesheets and runs a minimal cascade and block layout over the result
//! (see [`crate::rendering`]). It exposes the same `Engine` trait as the CDP
//! backend. Scripts never run, so pages that build their DOM client-side
//! produce sparse snapshots.

use crate::page::{ElementSnapshot, PageSnapshot};
use crate::rendering::RenderTree;
use crate::selector::static_selector;
use crate::{Engine, EngineConfig, Error, Result};
use log::{debug, info, warn};
use reqwest::blocking::Client;
use scraper::{ElementRef, Html};
use std::time::Duration;

/// A simple, dependency-light engine that does not run JavaScript.
pub struct SimpleEngine {
    client: Client,
    config: EngineConfig,
    /// Flattened but unstyled document of the last load.
    document: Option<PageSnapshot>,
    styles: Vec<String>,
}

/// Flatten an HTML document into document-ordered elements.
pub fn flatten_document(html: &str) -> PageSnapshot {
    let document = Html::parse_document(html);
    let mut page = PageSnapshot::default();
    let mut stack: Vec<(ElementRef<'_>, Option<usize>)> = vec![(document.root_element(), None)];
    while let Some((node, parent)) = stack.pop() {
        let value = node.value();
        let mut el = ElementSnapshot::new(value.name());
        el.parent = parent;
        el.attributes = value.attrs().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        el.text = node.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ");
        if el.tag == "svg" {
            el.markup = Some(node.html());
        }
        let index = page.push(el);
        let children: Vec<_> = node.children().filter_map(ElementRef::wrap).collect();
        for child in children.into_iter().rev() {
            stack.push((child, Some(index)));
        }
    }
    page
}

impl SimpleEngine {
    fn fetch(&self, url: &str) -> Result<String> {
        let mut request = self.client.get(url).header("User-Agent", self.config.user_agent.clone());
        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        let resp = request.send().map_err(|e| {
            if e.is_timeout() {
                Error::NavigationTimeout(self.config.timeout_ms)
            } else {
                Error::LoadError(format!("Failed to fetch {}: {}", url, e))
            }
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::LoadError(format!("HTTP {} for {}", status, url)));
        }
        resp.text()
            .map_err(|e| Error::NetworkError(format!("Failed to read response body: {}", e)))
    }

    /// Inline `<style>` blocks and linked stylesheets, in document order.
    fn extract_styles(&self, page: &PageSnapshot, base_url: &str) -> Vec<String> {
        let sources = static_selector("style, link[rel*=\"stylesheet\" i]");
        let base = url::Url::parse(base_url).ok();
        let mut styles = Vec::new();
        for (_, el) in page.select(&sources) {
            if el.tag == "style" {
                if !el.text.trim().is_empty() {
                    styles.push(el.text.clone());
                }
                continue;
            }
            let Some(href) = el.attr("href") else {
                continue;
            };
            let css_url = base
                .as_ref()
                .and_then(|b| b.join(href).ok())
                .map(|u| u.to_string())
                .unwrap_or_else(|| href.to_string());
            match self.fetch(&css_url) {
                Ok(text) if !text.trim().is_empty() => styles.push(text),
                Ok(_) => {}
                Err(e) => warn!("Skipping stylesheet {}: {}", css_url, e),
            }
        }
        styles
    }

    fn render_tree(&self) -> Result<RenderTree> {
        let document = self
            .document
            .clone()
            .ok_or_else(|| Error::RenderError("No document loaded".into()))?;
        Ok(RenderTree::build(document, &self.styles))
    }
}

impl Engine for SimpleEngine {
    fn new(config: EngineConfig) -> Result<Self>
    where
        Self: Sized,
    {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            document: None,
            styles: Vec::new(),
        })
    }

    fn load_url(&mut self, url: &str) -> Result<()> {
        info!("Loading {}", url);
        let body = self.fetch(url)?;

        let mut document = flatten_document(&body);
        document.url = url.to_string();
        document.viewport = self.config.viewport;

        self.styles = self.extract_styles(&document, url);
        debug!("{}: {} elements, {} stylesheets", url, document.elements.len(), self.styles.len());
        self.document = Some(document);
        Ok(())
    }

    fn page_snapshot(&self) -> Result<PageSnapshot> {
        Ok(self.render_tree()?.page)
    }

    fn render_png(&self) -> Result<Vec<u8>> {
        let shot = self.render_tree()?.screenshot(self.config.full_page)?;
        debug!("Rendered {}x{} screenshot", shot.width, shot.height);
        Ok(shot.png_data)
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serve(routes: Vec<(&'static str, &'static str, &'static str)>) -> String {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr();
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                let route = routes.iter().find(|(path, _, _)| *path == request.url());
                let response = match route {
                    Some((_, content_type, body)) => tiny_http::Response::from_string(*body).with_header(
                        tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()).unwrap(),
                    ),
                    None => tiny_http::Response::from_string("not found").with_status_code(404),
                };
                let _ = request.respond(response);
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn flatten_keeps_document_order_and_parents() {
        let page = flatten_document(
            "<html><head><title>Hi</title></head><body><div id=a><p>One   two</p></div><svg viewBox=\"0 0 1 1\"></svg></body></html>",
        );
        let tags: Vec<_> = page.elements.iter().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["html", "head", "title", "body", "div", "p", "svg"]);
        assert_eq!(page.elements[5].parent, Some(4));
        assert_eq!(page.elements[5].text, "One two");
        assert_eq!(page.elements[4].id(), Some("a"));
        assert!(page.elements[6].markup.as_deref().unwrap().starts_with("<svg"));
    }

    #[test]
    fn loads_page_with_linked_stylesheet() {
        let base = serve(vec![
            (
                "/",
                "text/html",
                "<html><head><link rel=\"stylesheet\" href=\"/site.css\"><style>h1 { color: #112233 }</style></head>\
                 <body><h1>Title</h1><button class=\"btn\">Go</button></body></html>",
            ),
            ("/site.css", "text/css", ":root { --brand-color: #ff6600 } .btn { background-color: var(--brand-color) }"),
        ]);

        let mut engine = SimpleEngine::new(EngineConfig::default()).unwrap();
        engine.load_url(&format!("{}/", base)).unwrap();
        let page = engine.page_snapshot().unwrap();
        assert_eq!(page.root_properties, vec![("--brand-color".to_string(), "#ff6600".to_string())]);
        let h1 = page.elements.iter().find(|e| e.tag == "h1").unwrap();
        assert_eq!(h1.style.color, "#112233");
        let button = page.elements.iter().find(|e| e.tag == "button").unwrap();
        assert_eq!(button.style.background_color, "#ff6600");
        assert!(button.rect.width > 0.0);

        let png = engine.render_png().unwrap();
        let img = image::load_from_memory(&png).unwrap();
        assert_eq!(img.width(), 1280);
        engine.close().unwrap();
    }

    #[test]
    fn child_combinators_and_structural_pseudo_classes_cascade() {
        let page = flatten_document(
            "<html><body><header><a class=\"btn\" href=\"/\">Shop</a></header>\
             <ul><li><button>First</button></li><li><button>Second</button></li></ul></body></html>",
        );
        let css = "header > .btn { background-color: #cc0000 } \
                   li:first-child button { background-color: #0000cc } \
                   a:hover, ul > button { background-color: #00ff00 }"
            .to_string();
        let tree = RenderTree::build(page, &[css]);
        let signals = crate::collect_signals(&tree.page);
        let backgrounds: Vec<_> = signals
            .buttons
            .iter()
            .map(|b| (b.text.as_str(), b.background_color.as_deref()))
            .collect();
        assert_eq!(
            backgrounds,
            vec![
                ("First", Some("#0000cc")),
                ("Second", Some("#efefef")),
                ("Shop", Some("#cc0000")),
            ]
        );
    }

    #[test]
    fn http_errors_fail_the_load() {
        let base = serve(vec![]);
        let mut engine = SimpleEngine::new(EngineConfig::default()).unwrap();
        let err = engine.load_url(&format!("{}/missing", base)).unwrap_err();
        assert!(matches!(err, Error::LoadError(_)));
        assert!(matches!(engine.page_snapshot(), Err(Error::RenderError(_))));
    }
}

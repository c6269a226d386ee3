use crate::utils;
use crate::PreviewMetadata;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use tracing::{debug, warn};
use url::Url;

/// Metadata extractor, responsible for extracting preview information from webpage content
///
/// The document is tokenized once, front to back. Tags are handled one at a time
/// with no tree building, so unclosed or overlapping markup does not matter.
#[derive(Clone)]
pub struct MetadataExtractor;

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Scan `html` fetched from `url` and return normalised preview fields.
    pub fn extract(&self, html: &str, url: &str) -> PreviewMetadata {
        let mut preview = self.scan(html);
        match Url::parse(url) {
            Ok(base) => normalize(&mut preview, url, &base),
            Err(e) => {
                warn!(url = %url, error = %e, "Cannot resolve links against request URL");
                if preview.url.is_empty() {
                    preview.url = url.to_string();
                }
            }
        }
        preview
    }

    /// Raw scan without URL resolution or defaults.
    pub fn scan(&self, html: &str) -> PreviewMetadata {
        let mut input = BufferQueue::new();
        input.push_back(StrTendril::from_slice(html));

        let mut tokenizer = Tokenizer::new(ScanState::default(), TokenizerOpts::default());
        let _ = tokenizer.feed(&mut input);
        tokenizer.end();

        let preview = tokenizer.sink.preview;
        debug!(
            title = %preview.title,
            has_description = !preview.description.is_empty(),
            has_image = !preview.image.is_empty(),
            "Scanned document metadata"
        );
        preview
    }
}

/// Fill defaults and resolve relative links against the request URL.
fn normalize(preview: &mut PreviewMetadata, request_url: &str, base: &Url) {
    if !preview.image.is_empty() {
        preview.image = utils::resolve_against(base, &preview.image);
    }

    if preview.favicon.is_empty() {
        preview.favicon = utils::default_favicon(base);
    } else {
        preview.favicon = utils::resolve_against(base, &preview.favicon);
    }

    if preview.url.is_empty() {
        preview.url = request_url.to_string();
    }

    if preview.site_name.is_empty() {
        preview.site_name = utils::netloc(base);
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Title,
    Description,
    Image,
    Url,
    SiteName,
    Type,
}

impl Field {
    /// `<meta property=...>` targets. These always overwrite.
    fn from_property(property: &str) -> Option<Self> {
        match property {
            "og:title" => Some(Field::Title),
            "og:description" => Some(Field::Description),
            "og:image" => Some(Field::Image),
            "og:url" => Some(Field::Url),
            "og:site_name" => Some(Field::SiteName),
            "og:type" => Some(Field::Type),
            _ => None,
        }
    }

    /// `<meta name=...>` targets. These only fill empty fields.
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "twitter:title" => Some(Field::Title),
            "twitter:description" | "description" => Some(Field::Description),
            "twitter:image" => Some(Field::Image),
            _ => None,
        }
    }

    fn slot(self, preview: &mut PreviewMetadata) -> &mut String {
        match self {
            Field::Title => &mut preview.title,
            Field::Description => &mut preview.description,
            Field::Image => &mut preview.image,
            Field::Url => &mut preview.url,
            Field::SiteName => &mut preview.site_name,
            Field::Type => &mut preview.kind,
        }
    }
}

#[derive(Default)]
struct ScanState {
    in_title: bool,
    title_buffer: String,
    preview: PreviewMetadata,
}

fn attr<'a>(tag: &'a Tag, name: &str) -> Option<&'a str> {
    tag.attrs
        .iter()
        .find(|a| &*a.name.local == name)
        .map(|a| &*a.value)
}

impl ScanState {
    fn start_tag(&mut self, tag: &Tag) -> TokenSinkResult<()> {
        match &*tag.name {
            "title" => {
                self.in_title = true;
                self.title_buffer.clear();
                if tag.self_closing {
                    self.finish_title();
                }
            }
            "link" => {
                let rel = attr(tag, "rel").unwrap_or_default();
                let href = attr(tag, "href").unwrap_or_default();
                if rel.contains("icon") && !href.is_empty() {
                    self.preview.favicon = href.to_string();
                }
            }
            "meta" => self.meta_tag(tag),
            "script" if !tag.self_closing => {
                return TokenSinkResult::RawData(RawKind::ScriptData);
            }
            "style" if !tag.self_closing => {
                return TokenSinkResult::RawData(RawKind::Rawtext);
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }

    fn meta_tag(&mut self, tag: &Tag) {
        let content = attr(tag, "content").unwrap_or_default();
        if content.is_empty() {
            return;
        }

        if let Some(field) = attr(tag, "property").and_then(Field::from_property) {
            *field.slot(&mut self.preview) = content.to_string();
        }

        if let Some(field) = attr(tag, "name").and_then(Field::from_name) {
            let slot = field.slot(&mut self.preview);
            if slot.is_empty() {
                *slot = content.to_string();
            }
        }
    }

    fn end_tag(&mut self, tag: &Tag) {
        if &*tag.name == "title" {
            self.finish_title();
        }
    }

    fn finish_title(&mut self) {
        self.in_title = false;
        if self.preview.title.is_empty() {
            self.preview.title = self.title_buffer.trim().to_string();
        }
    }
}

impl TokenSink for ScanState {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => return self.start_tag(&tag),
                TagKind::EndTag => self.end_tag(&tag),
            },
            Token::CharacterTokens(text) if self.in_title => {
                self.title_buffer.push_str(&text);
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

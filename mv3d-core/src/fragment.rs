/// Address-bar fragment codec for the active model name
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters that may not appear raw in a URL fragment
const FRAGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// `"Bust"` -> `"#Bust"`
pub fn encode(name: &str) -> String {
    format!("#{}", utf8_percent_encode(name, FRAGMENT))
}

/// Model name carried by a location hash, if any.
pub fn decode(hash: &str) -> Option<String> {
    let raw = hash.strip_prefix('#').unwrap_or(hash);
    if raw.is_empty() {
        return None;
    }
    Some(percent_decode_str(raw).decode_utf8_lossy().into_owned())
}

/// Where the active model name is published and read back on startup.
pub trait Navigation {
    fn publish(&mut self, fragment: &str);
    fn fragment(&self) -> Option<String>;
}

/// In-process navigation used by the terminal front end and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryNavigation {
    hash: Option<String>,
}

impl MemoryNavigation {
    pub fn new(initial: Option<String>) -> Self {
        Self { hash: initial }
    }
}

impl Navigation for MemoryNavigation {
    fn publish(&mut self, fragment: &str) {
        self.hash = Some(fragment.to_string());
    }

    fn fragment(&self) -> Option<String> {
        self.hash.clone()
    }
}

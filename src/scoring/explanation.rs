use serde::Serialize;

/// Score breakdown for one document, mirroring how the score was computed.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    pub value: f32,
    pub description: String,
    pub matched: bool,
    pub details: Vec<Explanation>,
}

impl Explanation {
    pub fn matched(value: f32, description: String) -> Self {
        Explanation {
            value,
            description,
            matched: true,
            details: Vec::new(),
        }
    }

    pub fn no_match(description: String) -> Self {
        Explanation {
            value: 0.0,
            description,
            matched: false,
            details: Vec::new(),
        }
    }

    pub fn with_detail(mut self, detail: Explanation) -> Self {
        self.details.push(detail);
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

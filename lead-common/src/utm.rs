use url::Url;

/// UTM attribution parameters captured from the landing page URL. Absent parameters are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmParams {
    pub source: String,
    pub medium: String,
    pub campaign: String,
    pub term: String,
    pub content: String,
}

impl UtmParams {
    /// Read the UTM parameters from a full page URL. An unparseable URL yields no parameters.
    pub fn from_page_url(page_url: &str) -> Self {
        match Url::parse(page_url) {
            Ok(url) => Self::from_query(url.query().unwrap_or_default()),
            Err(_) => Self::default(),
        }
    }

    /// Read the UTM parameters from a query string, with or without its leading `?`.
    /// When a key repeats, the first occurrence wins.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::default();
        let mut seen = [false; 5];

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let index = match key.as_ref() {
                "utm_source" => 0,
                "utm_medium" => 1,
                "utm_campaign" => 2,
                "utm_term" => 3,
                "utm_content" => 4,
                _ => continue,
            };
            if seen[index] {
                continue;
            }
            seen[index] = true;

            let slot = match index {
                0 => &mut params.source,
                1 => &mut params.medium,
                2 => &mut params.campaign,
                3 => &mut params.term,
                _ => &mut params.content,
            };
            *slot = value.into_owned();
        }

        params
    }

    /// Every parameter as `(query key, value)`, in redirect order: source, campaign, medium,
    /// content, term.
    pub fn ordered(&self) -> [(&'static str, &str); 5] {
        [
            ("utm_source", self.source.as_str()),
            ("utm_campaign", self.campaign.as_str()),
            ("utm_medium", self.medium.as_str()),
            ("utm_content", self.content.as_str()),
            ("utm_term", self.term.as_str()),
        ]
    }

    /// Only the parameters that carry a value, in redirect order.
    pub fn present(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.ordered()
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }
}

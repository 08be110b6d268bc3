//! Finnhub quote provider.
//!
//! One blocking GET per call against `/api/v1/quote` with `symbol` and
//! `token` query parameters. No retry: any transport error, non-success
//! status, or undecodable body fails the call.

use super::{FetchError, QuoteSource, RawQuote};

/// Finnhub quote client. Build once and share.
pub struct FinnhubClient {
    client: reqwest::blocking::Client,
    api_url: String,
    api_key: Option<String>,
}

impl FinnhubClient {
    pub fn new(
        client: reqwest::blocking::Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key,
        }
    }

    /// Build with a default blocking client. Timeouts are reqwest's defaults.
    pub fn with_default_client(
        api_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, FetchError> {
        let api_url = api_url.into();
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("quotevault/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Request {
                url: api_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self::new(client, api_url, api_key))
    }

    /// Decode a response body into a RawQuote.
    pub fn parse_quote(symbol: &str, body: &str) -> Result<RawQuote, FetchError> {
        serde_json::from_str(body).map_err(|e| FetchError::Malformed {
            symbol: symbol.to_string(),
            message: e.to_string(),
        })
    }
}

impl QuoteSource for FinnhubClient {
    fn name(&self) -> &str {
        "finnhub"
    }

    fn fetch_quote(&self, symbol: &str) -> Result<RawQuote, FetchError> {
        let mut query = vec![("symbol", symbol)];
        if let Some(key) = self.api_key.as_deref() {
            query.push(("token", key));
        }

        tracing::debug!(symbol, url = %self.api_url, "requesting quote");

        let resp = self
            .client
            .get(&self.api_url)
            .query(&query)
            .send()
            .map_err(|e| FetchError::Request {
                // reqwest includes the URL (and token) in its Display; keep only the kind.
                url: self.api_url.clone(),
                message: e.without_url().to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().map_err(|e| FetchError::Malformed {
            symbol: symbol.to_string(),
            message: e.without_url().to_string(),
        })?;
        Self::parse_quote(symbol, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve exactly one HTTP response on a local port, returning the
    /// endpoint URL and a receiver for the raw request line.
    fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            // Drain headers
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            tx.send(request_line).unwrap();

            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });

        (format!("http://{addr}/api/v1/quote"), rx)
    }

    /// Client that never routes loopback traffic through an ambient proxy.
    fn local_client(url: String, key: Option<&str>) -> FinnhubClient {
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .build()
            .unwrap();
        FinnhubClient::new(client, url, key.map(str::to_string))
    }

    #[test]
    fn parses_full_finnhub_body() {
        let body = r#"{"c":150.2,"d":0.4,"dp":0.267,"h":151.0,"l":149.5,"o":150.0,"pc":149.8,"t":1700000000}"#;
        let quote = FinnhubClient::parse_quote("AAPL", body).unwrap();
        assert_eq!(quote.current, Some(150.2));
        assert_eq!(quote.high, Some(151.0));
        assert_eq!(quote.low, Some(149.5));
        assert_eq!(quote.open, Some(150.0));
        assert_eq!(quote.previous_close, Some(149.8));
        assert_eq!(quote.quote_time, Some(1_700_000_000));
    }

    #[test]
    fn missing_fields_parse_as_none() {
        let quote = FinnhubClient::parse_quote("AAPL", r#"{"c":1.0}"#).unwrap();
        assert_eq!(quote.current, Some(1.0));
        assert!(quote.previous_close.is_none());
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = FinnhubClient::parse_quote("AAPL", "<html>").unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
    }

    #[test]
    fn fetch_sends_symbol_and_token() {
        let (url, requests) = one_shot_server(
            "200 OK",
            r#"{"c":150.2,"h":151.0,"l":149.5,"o":150.0,"pc":149.8}"#,
        );
        let client = local_client(url, Some("abc123"));

        let quote = client.fetch_quote("AAPL").unwrap();
        assert_eq!(quote.current, Some(150.2));

        let request_line = requests.recv().unwrap();
        assert!(request_line.starts_with("GET /api/v1/quote?"));
        assert!(request_line.contains("symbol=AAPL"));
        assert!(request_line.contains("token=abc123"));
    }

    #[test]
    fn fetch_without_key_omits_token() {
        let (url, requests) = one_shot_server("200 OK", r#"{"c":1.0}"#);
        let client = local_client(url, None);

        client.fetch_quote("AAPL").unwrap();
        let request_line = requests.recv().unwrap();
        assert!(!request_line.contains("token="));
    }

    #[test]
    fn non_success_status_fails() {
        let (url, _requests) =
            one_shot_server("401 Unauthorized", r#"{"error":"Invalid API key"}"#);
        let client = local_client(url, Some("bad"));

        match client.fetch_quote("AAPL") {
            Err(FetchError::Status { symbol, status }) => {
                assert_eq!(symbol, "AAPL");
                assert_eq!(status, 401);
            }
            other => panic!("expected Status error, got: {other:?}"),
        }
    }

    #[test]
    fn unreachable_host_is_request_error() {
        // Bind then drop to get a port nobody listens on.
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let client = local_client(format!("http://127.0.0.1:{port}/quote"), None);

        let err = client.fetch_quote("AAPL").unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }), "got {err:?}");
    }
}

//! Request transport for the device's HTTP control API.
//!
//! [`Transport`] is the seam between the session layer and the network: the
//! session only ever sees response bodies or typed errors. [`HttpTransport`]
//! is the production implementation on top of `reqwest`; tests substitute a
//! scripted in-memory implementation.
//!
//! There is no request-level cancellation: once a call is issued it runs to
//! completion (or to the client timeout) even if the caller stops waiting.

use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Ordered key/value pairs sent as query string or form body.
pub type Params = Vec<(&'static str, String)>;

/// A file attached to a multipart request.
#[derive(Debug, Clone)]
pub struct Upload {
	/// Form field name carrying the file.
	pub field: &'static str,
	/// File name reported to the device (base name only).
	pub file_name: String,
	pub content_type: &'static str,
	pub bytes: Vec<u8>,
}

/// Issues requests against one device and returns raw response bodies.
///
/// Implementations map transport failures to [`Error::Network`] and
/// non-success statuses to [`Error::Protocol`].
pub trait Transport: Send + Sync {
	/// `GET endpoint?query`.
	fn get(&self, endpoint: &'static str, query: Params) -> BoxFuture<'_, Result<Vec<u8>>>;

	/// `POST endpoint` with a url-encoded form body.
	fn post_form(&self, endpoint: &'static str, form: Params) -> BoxFuture<'_, Result<Vec<u8>>>;

	/// `POST endpoint` with a multipart body of text fields plus one file.
	fn post_multipart(
		&self,
		endpoint: &'static str,
		fields: Params,
		upload: Upload,
	) -> BoxFuture<'_, Result<Vec<u8>>>;
}

/// Expands a bare host to the device base URL; full URLs pass through.
///
/// Trailing slashes are stripped so endpoint paths can be appended.
pub fn base_url_for(address: &str, default_port: u16) -> String {
	let address = address.trim().trim_end_matches('/');
	if address.contains("://") {
		address.to_string()
	} else {
		format!("http://{address}:{default_port}")
	}
}

/// [`Transport`] backed by a `reqwest` client.
///
/// Each call is an independent request; the session relies on no pooling
/// behavior.
#[derive(Debug, Clone)]
pub struct HttpTransport {
	client: reqwest::Client,
	base_url: String,
}

impl HttpTransport {
	/// Creates a transport for `base_url` with a per-request timeout.
	pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
		let base_url = base_url.into();
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| Error::Network {
				endpoint: base_url.clone(),
				message: format!("failed to create HTTP client: {e}"),
			})?;
		Ok(Self { client, base_url })
	}

	/// Returns the base URL requests are issued against.
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	fn url(&self, endpoint: &str) -> String {
		format!("{}{}", self.base_url, endpoint)
	}

	async fn finish(endpoint: &'static str, request: reqwest::RequestBuilder) -> Result<Vec<u8>> {
		let response = request.send().await.map_err(|e| {
			debug!(target = "snap.http", endpoint, error = %e, "request failed");
			Error::Network {
				endpoint: endpoint.to_string(),
				message: e.to_string(),
			}
		})?;

		let status = response.status();
		if !status.is_success() {
			debug!(target = "snap.http", endpoint, status = status.as_u16(), "non-success status");
			return Err(Error::Protocol {
				endpoint: endpoint.to_string(),
				status: status.as_u16(),
			});
		}

		let body = response.bytes().await.map_err(|e| Error::Network {
			endpoint: endpoint.to_string(),
			message: format!("failed to read body: {e}"),
		})?;
		trace!(target = "snap.http", endpoint, bytes = body.len(), "response");
		Ok(body.to_vec())
	}
}

impl Transport for HttpTransport {
	fn get(&self, endpoint: &'static str, query: Params) -> BoxFuture<'_, Result<Vec<u8>>> {
		Box::pin(async move {
			trace!(target = "snap.http", endpoint, "GET");
			let request = self.client.get(self.url(endpoint)).query(&query);
			Self::finish(endpoint, request).await
		})
	}

	fn post_form(&self, endpoint: &'static str, form: Params) -> BoxFuture<'_, Result<Vec<u8>>> {
		Box::pin(async move {
			trace!(target = "snap.http", endpoint, "POST");
			let request = self.client.post(self.url(endpoint)).form(&form);
			Self::finish(endpoint, request).await
		})
	}

	fn post_multipart(
		&self,
		endpoint: &'static str,
		fields: Params,
		upload: Upload,
	) -> BoxFuture<'_, Result<Vec<u8>>> {
		Box::pin(async move {
			trace!(target = "snap.http", endpoint, file = %upload.file_name, "POST multipart");
			let mut form = reqwest::multipart::Form::new();
			for (name, value) in fields {
				form = form.text(name, value);
			}
			let part = reqwest::multipart::Part::bytes(upload.bytes)
				.file_name(upload.file_name)
				.mime_str(upload.content_type)
				.map_err(|e| Error::InvalidArgument(format!("content type: {e}")))?;
			form = form.part(upload.field, part);

			let request = self.client.post(self.url(endpoint)).multipart(form);
			Self::finish(endpoint, request).await
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bare_host_gets_default_port() {
		assert_eq!(base_url_for("192.168.1.20", 8080), "http://192.168.1.20:8080");
		assert_eq!(base_url_for(" snapmaker.local ", 8080), "http://snapmaker.local:8080");
	}

	#[test]
	fn full_url_is_kept_without_trailing_slash() {
		assert_eq!(base_url_for("http://127.0.0.1:3000/", 8080), "http://127.0.0.1:3000");
		assert_eq!(base_url_for("https://printer.lan", 8080), "https://printer.lan");
	}

	#[test]
	fn transport_joins_endpoint_onto_base() {
		let transport = HttpTransport::new("http://10.0.0.2:8080", Duration::from_secs(1)).unwrap();
		assert_eq!(transport.base_url(), "http://10.0.0.2:8080");
		assert_eq!(transport.url("/api/v1/status"), "http://10.0.0.2:8080/api/v1/status");
	}
}

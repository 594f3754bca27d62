//! Channel - authenticated request proxy for one device session.
//!
//! The Channel attaches the session token to every call and decodes JSON
//! bodies into typed responses, tagging decode failures with the subsystem
//! they came from.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{Error, Result, Subsystem};
use crate::transport::{Params, Transport, Upload};

/// Channel provides token-carrying calls against a [`Transport`].
///
/// The address/token pair is read-only once built, so clones can be shared
/// freely across concurrent requests.
#[derive(Clone)]
pub struct Channel {
	transport: Arc<dyn Transport>,
	token: Arc<str>,
}

impl Channel {
	/// Creates a new Channel sending `token` with every request.
	pub fn new(transport: Arc<dyn Transport>, token: impl Into<Arc<str>>) -> Self {
		Self {
			transport,
			token: token.into(),
		}
	}

	/// Returns the session token.
	pub fn token(&self) -> &str {
		&self.token
	}

	fn with_token(&self, params: Params) -> Params {
		let mut all = Vec::with_capacity(params.len() + 1);
		all.push(("token", self.token.to_string()));
		all.extend(params);
		all
	}

	/// Issues a GET and returns the raw body.
	pub async fn fetch(&self, endpoint: &'static str, params: Params) -> Result<Vec<u8>> {
		self.transport.get(endpoint, self.with_token(params)).await
	}

	/// Issues a GET and decodes the JSON body.
	pub async fn query<R: DeserializeOwned>(
		&self,
		endpoint: &'static str,
		subsystem: Subsystem,
		params: Params,
	) -> Result<R> {
		let body = self.fetch(endpoint, params).await?;
		serde_json::from_slice(&body).map_err(|e| Error::decode(subsystem, e))
	}

	/// Issues a form POST and discards the body.
	pub async fn send(&self, endpoint: &'static str, params: Params) -> Result<()> {
		self.transport.post_form(endpoint, self.with_token(params)).await?;
		Ok(())
	}

	/// Issues a form POST and decodes the JSON body.
	pub async fn send_decoded<R: DeserializeOwned>(
		&self,
		endpoint: &'static str,
		subsystem: Subsystem,
		params: Params,
	) -> Result<R> {
		let body = self.transport.post_form(endpoint, self.with_token(params)).await?;
		serde_json::from_slice(&body).map_err(|e| Error::decode(subsystem, e))
	}

	/// Issues a multipart POST with the token as the first text field.
	pub async fn upload(&self, endpoint: &'static str, params: Params, upload: Upload) -> Result<Vec<u8>> {
		self.transport
			.post_multipart(endpoint, self.with_token(params), upload)
			.await
	}
}

impl std::fmt::Debug for Channel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Channel").finish_non_exhaustive()
	}
}

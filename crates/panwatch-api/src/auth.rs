// API key generation
//
// `type=keygen` exchanges administrator credentials for an API key. The
// key is stored on the client and sent as `X-PAN-KEY` from then on.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::XmlApiClient;
use crate::error::Error;
use crate::models::child_text;

impl XmlApiClient {
    /// Authenticate with username/password and store the generated key.
    ///
    /// `POST /api/` with `type=keygen&user=...&password=...`; the reply is
    /// `<response status="success"><result><key>...</key></result></response>`.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        debug!(username, "generating API key");

        let resp = self
            .request_unauthenticated(&[
                ("type", "keygen"),
                ("user", username),
                ("password", password.expose_secret()),
            ])
            .await
            .map_err(|e| match e {
                Error::Api { message, .. } => Error::Authentication { message },
                other => other,
            })?;

        let key = {
            let doc = resp.document()?;
            doc.descendants()
                .find(|n| n.is_element() && n.tag_name().name() == "result")
                .and_then(|result| child_text(result, "key"))
        };

        let key = key.ok_or_else(|| Error::Authentication {
            message: "keygen response did not contain a key".into(),
        })?;

        self.set_api_key(SecretString::from(key));
        debug!("API key generated");
        Ok(())
    }
}

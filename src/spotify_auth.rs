use std::{fs, io::stdin};

use rspotify::{prelude::OAuthClient, AuthCodeSpotify, Credentials, OAuth};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::{token_cache_path, Settings, SPOTIFY_SCOPES},
    error::{Error, Result},
};

/// Builds an authorized client, reusing the cached token when there is one.
pub async fn get_spotify_client(settings: &Settings) -> Result<AuthCodeSpotify> {
    settings.ensure_valid()?;

    let oauth = OAuth {
        scopes: SPOTIFY_SCOPES.iter().map(|s| s.to_string()).collect(),
        redirect_uri: settings.redirect_uri.clone(),
        ..Default::default()
    };
    let creds = Credentials::new(&settings.client_id, &settings.client_secret);

    let cache_path = token_cache_path();
    if let Some(dir) = cache_path.parent() {
        fs::create_dir_all(dir)?;
    }

    let config = rspotify::Config {
        token_cached: true,
        token_refreshing: true,
        cache_path,
        ..Default::default()
    };

    let mut spotify = AuthCodeSpotify::with_config(creds, oauth, config);

    match spotify.read_token_cache(true).await {
        Ok(Some(token)) => {
            debug!("Using cached Spotify token");
            *spotify
                .token
                .lock()
                .await
                .map_err(|_| Error::Auth("token lock unavailable".into()))? = Some(token);
        }
        Ok(None) => {
            info!("No cached Spotify token, starting authorization");
            handle_authorization_flow(&mut spotify).await?;
        }
        Err(e) => {
            warn!("Failed to read token cache: {e}");
            handle_authorization_flow(&mut spotify).await?;
        }
    }

    Ok(spotify)
}

async fn handle_authorization_flow(spotify: &mut AuthCodeSpotify) -> Result<()> {
    let auth_url = spotify
        .get_authorize_url(true)
        .map_err(|e| Error::Auth(format!("could not build authorize URL: {e}")))?;

    if webbrowser::open(&auth_url).is_err() {
        println!("Failed to open the authorization URL. Please visit the URL manually: {auth_url}");
    }

    println!("Enter redirected url:");
    let mut url_input = String::new();
    stdin().read_line(&mut url_input)?;

    let code = code_from_redirect(&url_input)?;
    spotify
        .request_token(&code)
        .await
        .map_err(|e| Error::Auth(format!("token request rejected: {e}")))?;

    info!("Spotify authorization complete");
    Ok(())
}

/// Pulls the `code` query parameter out of the pasted redirect URL.
pub fn code_from_redirect(redirected: &str) -> Result<String> {
    let url = Url::parse(redirected.trim())
        .map_err(|e| Error::Auth(format!("invalid redirect URL: {e}")))?;

    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.trim().to_string())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| Error::Auth("redirect URL has no authorization code".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_extracted() {
        let code =
            code_from_redirect("http://localhost:8888/callback?code=AQB12_x&state=abc\n").unwrap();
        assert_eq!(code, "AQB12_x");
    }

    #[test]
    fn missing_code_is_an_auth_error() {
        let err = code_from_redirect("http://localhost:8888/callback?error=access_denied")
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert!(matches!(code_from_redirect("garbage"), Err(Error::Auth(_))));
    }
}

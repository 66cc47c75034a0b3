use super::Env;
use crate::output::Output;
use color_eyre::eyre::{eyre, Context};
use color_eyre::Result;
use media_shelf_config::GatewayBackend;
use media_shelf_gateway::{create_http_client, sign_in_with_password};
use serde_json::json;
use std::io;
use std::time::Duration;
use tracing::info;

pub async fn run_session(cmd: crate::SessionCommands, env: &Env, output: &Output) -> Result<()> {
    match cmd {
        crate::SessionCommands::Login { email, user_id } => login(email, user_id, env, output).await,
        crate::SessionCommands::Logout => logout(env, output),
        crate::SessionCommands::Show => show(env, output),
    }
}

async fn login(email: Option<String>, user_id: Option<String>, env: &Env, output: &Output) -> Result<()> {
    let mut session = env.load_session()?;

    if env.config.gateway.backend != GatewayBackend::Firestore {
        let user_id = user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| eyre!("The {:?} backend has no accounts; pass --user-id <ID>", env.config.gateway.backend))?;
        if user_id.contains('/') {
            return Err(eyre!("User id must not contain '/'"));
        }
        session.set_user_id(user_id.clone());
        session.save().map_err(|e| eyre!("Failed to save session: {}", e))?;
        info!("Signed in locally as {}", user_id);
        output.success(format!("Signed in as {}", user_id));
        return Ok(());
    }

    let firestore = env
        .config
        .gateway
        .firestore
        .as_ref()
        .ok_or_else(|| eyre!("[gateway.firestore] is missing from {}", env.config_path.display()))?;

    let email = match email {
        Some(email) => email,
        None => {
            output.prompt("Email: ")?;
            let mut line = String::new();
            io::stdin().read_line(&mut line).context("Failed to read email")?;
            line.trim().to_string()
        }
    };
    if email.is_empty() {
        return Err(eyre!("Email is required"));
    }
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let client = create_http_client(Duration::from_secs(firestore.timeout_secs));
    let auth = sign_in_with_password(&client, &firestore.auth_base_url, &firestore.api_key, &email, &password)
        .await
        .map_err(|e| eyre!("{}", e))?;

    session.set_user_id(auth.user_id.clone());
    session.set_email(auth.email.clone().unwrap_or(email));
    session.set_id_token(auth.id_token);
    session.set_refresh_token(auth.refresh_token);
    session.set_token_expires(auth.expires_at);
    session.save().map_err(|e| eyre!("Failed to save session: {}", e))?;

    output.success(format!("Signed in as {}", auth.user_id));
    Ok(())
}

fn logout(env: &Env, output: &Output) -> Result<()> {
    let mut session = env.load_session()?;
    if session.get_user_id().is_none() {
        output.info("Not signed in");
        return Ok(());
    }
    session.clear().map_err(|e| eyre!("Failed to remove session file: {}", e))?;
    output.success("Signed out");
    Ok(())
}

fn show(env: &Env, output: &Output) -> Result<()> {
    let session = env.load_session()?;
    let user_id = session.get_user_id().cloned();
    let email = session.get_email().cloned();
    let expires = session.get_token_expires().map(|t| t.to_rfc3339());

    if !output.is_human() {
        output.json(&json!({
            "type": "session",
            "signed_in": user_id.is_some(),
            "user_id": user_id,
            "email": email,
            "token_expires": expires,
            "backend": format!("{:?}", env.config.gateway.backend).to_lowercase(),
        }));
        return Ok(());
    }

    match user_id {
        Some(user_id) => {
            output.info(format!("Signed in as {}", user_id));
            if let Some(email) = email {
                output.info(format!("Email: {}", email));
            }
            if let Some(expires) = expires {
                output.info(format!("Token expires: {}", expires));
            }
        }
        None => output.info("Not signed in"),
    }
    Ok(())
}

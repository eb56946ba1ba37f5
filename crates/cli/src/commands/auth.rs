//! Session commands.
//!
//! # Usage
//!
//! ```bash
//! kotob auth login -e reader@example.com -p 'secret123'
//! kotob auth register -n "Mona Adel" -e mona@example.com -p 'secret123' \
//!     --confirm-password 'secret123' --phone 01012345678 --address "12 Nile St" --age 24
//! kotob auth whoami
//! kotob auth logout
//! ```
//!
//! Passwords may also come from `KOTOB_PASSWORD` to keep them out of shell
//! history.

use clap::Subcommand;
use kotob_client::validation::{
    LoginForm, RegisterForm, ValidationError, validate_email, validate_password,
};
use kotob_client::{ClientError, ClientState};
use secrecy::SecretString;
use tracing::info;

use crate::output;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in and merge the guest cart and favorites into the account
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "KOTOB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and merge the guest cart and favorites into it
    Register {
        /// Full name
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "KOTOB_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        confirm_password: String,

        #[arg(long)]
        phone: String,

        #[arg(long)]
        address: String,

        #[arg(long)]
        age: Option<u32>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Request a password reset email
    ForgotPassword {
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password with the emailed reset token
    ResetPassword {
        #[arg(short, long)]
        token: String,

        #[arg(short, long, env = "KOTOB_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

pub async fn run(state: &ClientState, action: AuthAction) -> Result<(), ClientError> {
    match action {
        AuthAction::Login { email, password } => {
            let credentials = LoginForm { email, password }.validate()?;
            let user = state.auth().login(&credentials).await?;
            info!(email = %user.email, role = %user.role, "مرحبًا {}", user.name);
            merge_guest_state(state).await
        }
        AuthAction::Register {
            name,
            email,
            password,
            confirm_password,
            phone,
            address,
            age,
        } => {
            let registration = RegisterForm {
                name,
                email,
                password,
                confirm_password,
                phone,
                address,
                age,
            }
            .validate()?;
            let user = state.auth().register(&registration).await?;
            info!(email = %user.email, "تم إنشاء الحساب بنجاح");
            merge_guest_state(state).await
        }
        AuthAction::Logout => {
            state.auth().logout()?;
            info!("تم تسجيل الخروج");
            Ok(())
        }
        AuthAction::Whoami => {
            match state.auth().current_user() {
                Some(user) => info!(
                    id = %user.id,
                    email = %user.email,
                    role = %user.role,
                    "{}",
                    user.name
                ),
                None => info!("Not signed in (guest)"),
            }
            Ok(())
        }
        AuthAction::ForgotPassword { email } => {
            let email = validate_email(&email).map_err(ValidationError::from)?;
            let message = state.auth().forgot_password(&email).await?;
            info!("{}", message.as_deref().unwrap_or("تم إرسال رابط إعادة تعيين كلمة المرور"));
            Ok(())
        }
        AuthAction::ResetPassword { token, password } => {
            validate_password(&password).map_err(ValidationError::from)?;
            let message = state
                .auth()
                .reset_password(&token, &SecretString::from(password))
                .await?;
            info!("{}", message.as_deref().unwrap_or("تم تغيير كلمة المرور بنجاح"));
            Ok(())
        }
    }
}

/// Replay the guest cart, then the guest favorites, into the new session.
async fn merge_guest_state(state: &ClientState) -> Result<(), ClientError> {
    let cart = state.cart().merge_cart_on_login().await?;
    output::merge("cart lines", &cart);
    let favorites = state.favorites().merge_favorites_on_login().await?;
    output::merge("favorites", &favorites);
    Ok(())
}

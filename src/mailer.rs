//! Transactional mail
//!
//! Handlers only build a [Mail] and hand it to whatever [Mailer] the app
//! was started with: SMTP in production, the log when no relay is
//! configured, or a recording mailer in tests.

use async_trait::async_trait;
use color_eyre::{eyre::Context, Report};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use tracing::info;
use url::Url;

use crate::{settings::MailConfig, types::Password};

/// A plain text mail to a single recipient
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mail {
    /// Recipient address
    pub to: String,
    #[allow(missing_docs)]
    pub subject: String,
    /// Plain text body
    pub body: String,
}

/// Anything that can deliver a [Mail]
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers the mail or fails, retrying is up to the caller
    async fn send(&self, mail: Mail) -> Result<(), Report>;
}

/// Sends mails through an SMTP relay using TLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Sets up the relay, no connection is made until the first mail
    pub fn new(config: &MailConfig) -> Result<Self, Report> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .wrap_err_with(|| format!("Setting up SMTP relay {}", config.host))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().clone(),
            ));
        if let Some(port) = config.port {
            builder = builder.port(port);
        }

        Ok(Self {
            transport: builder.build(),
            from: config
                .from
                .parse()
                .wrap_err_with(|| format!("{:?} is not a valid sender", config.from))?,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    #[tracing::instrument(skip(self, mail), fields(to = %mail.to, subject = %mail.subject))]
    async fn send(&self, mail: Mail) -> Result<(), Report> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(mail.to.parse().wrap_err("Parsing the recipient")?)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body)
            .wrap_err("Building the mail")?;

        let response = self
            .transport
            .send(message)
            .await
            .wrap_err("Sending the mail")?;
        info!(code = %response.code(), "Mail sent");

        Ok(())
    }
}

/// Writes mails to the log instead of sending them
///
/// Meant for development, the log will contain reset links and generated
/// passwords in clear.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> Result<(), Report> {
        info!(to = %mail.to, subject = %mail.subject, "Not sending mail:\n{}", mail.body);
        Ok(())
    }
}

/// `{public_url}/{path}/{token}`, regardless of trailing slashes in the
/// configured url
pub(crate) fn link(public_url: &Url, path: &str, token: &str) -> String {
    format!(
        "{}/{}/{token}",
        public_url.as_str().trim_end_matches('/'),
        path.trim_matches('/')
    )
}

impl Mail {
    /// Greets a freshly signed up user
    ///
    /// If the password was generated, it is part of the mail since it's
    /// the only way the user can learn it.
    pub(crate) fn welcome(to: &str, first_name: &str, generated: Option<&Password>) -> Self {
        let mut body = format!("Hi {first_name},\n\nwelcome to Spendwise!\n");
        if let Some(password) = generated {
            body.push_str(&format!(
                "\nYour password is: {}\nPlease change it after your first login.\n",
                password.expose()
            ));
        }

        Self {
            to: to.to_owned(),
            subject: "Welcome to Spendwise".to_owned(),
            body,
        }
    }

    pub(crate) fn verification(to: &str, link: &str) -> Self {
        Self {
            to: to.to_owned(),
            subject: "Please verify your email address".to_owned(),
            body: format!("Open the following link to verify your email address:\n\n{link}\n"),
        }
    }

    pub(crate) fn password_reset(to: &str, link: &str) -> Self {
        Self {
            to: to.to_owned(),
            subject: "Reset your password".to_owned(),
            body: format!(
                "Someone requested a password reset for your account.\n\
                 If it was you, open the following link:\n\n{link}\n\n\
                 Otherwise you can ignore this mail.\n"
            ),
        }
    }
}

use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use secrecy::Secret;
use contact_relay::configuration::{get_configuration, Environment, Settings};
use contact_relay::email_client::{EmailClient, MailTransport};
use contact_relay::email_request::OutgoingEmail;
use contact_relay::startup::Application;
use contact_relay::telemetry::{get_subscriber, init_subscriber};

// Ensure that the `tracing` stack is only initialized once rather than for each test case
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_lvl = "info".to_string();
    let subscriber_name = "test".to_string();

    // The sink is part of the type returned by `get_subscriber`, so both
    // branches have to initialize the subscriber on their own
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_lvl, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_lvl, std::io::sink);
        init_subscriber(subscriber);
    }
});

/// Stands in for the SMTP relay: records every message it is handed and
/// optionally fails every send.
#[derive(Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutgoingEmail>>,
    failure: Option<String>,
}

impl RecordingTransport {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(reason.to_string()),
            ..Default::default()
        })
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: OutgoingEmail) -> Result<(), anyhow::Error> {
        self.sent.lock().unwrap().push(email);
        match &self.failure {
            Some(reason) => Err(anyhow::anyhow!(reason.clone())),
            None => Ok(()),
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub mail: Arc<RecordingTransport>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub fn contact_url(&self) -> String {
        format!("{}/api/contact", &self.address)
    }

    pub async fn post_contact(&self, body: &serde_json::Value) -> reqwest::Response {
        self.api_client
            .post(&self.contact_url())
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn request_contact(&self, method: reqwest::Method) -> reqwest::Response {
        self.api_client
            .request(method, &self.contact_url())
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Spin up the application in the background, with a working mail transport
pub async fn spawn_app() -> TestApp {
    spawn_app_with(RecordingTransport::accepting(), |_| {}).await
}

/// Spin up the application in the background, letting the test adjust the
/// configuration before the server is built
pub async fn spawn_app_with<F>(mail: Arc<RecordingTransport>, customize: F) -> TestApp
where
    F: FnOnce(&mut Settings),
{
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // Next invocations get skipped
    Lazy::force(&TRACING);

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration");
        // Use a random OS port
        c.application.port = 0;
        c.application.host = "127.0.0.1".into();
        c.environment = Environment::Local;
        c.email_client.host = Some("smtp.example.com".into());
        c.email_client.username = Some("owner@example.com".into());
        c.email_client.password = Some(Secret::new("app-password".into()));
        c.email_client.contact_email = Some("inbox@example.com".into());
        customize(&mut c);
        c
    };

    let email_client = EmailClient::with_transport(&configuration.email_client, mail.clone())
        .expect("Failed to build the email client");
    let application = Application::build_with_email_client(configuration, email_client)
        .await
        .expect("Failed to build application");
    let port = application.port();
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        port,
        mail,
        api_client: reqwest::Client::new(),
    }
}

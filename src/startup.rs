use std::net::TcpListener;
use actix_web::dev::Server;
use actix_web::http::Method;
use actix_web::{web, App, HttpServer};
use tracing_actix_web::TracingLogger;
use crate::configuration::{Environment, Settings};
use crate::email_client::EmailClient;
use crate::routes::{
    contact, contact_preflight, cors_headers, health_check, json_error_handler, method_not_allowed,
};

/// Holds the newly built server and its port
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Builds the server with an SMTP backed email client.
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let email_client = EmailClient::from_settings(&configuration.email_client)?;
        Self::build_with_email_client(configuration, email_client).await
    }

    pub async fn build_with_email_client(
        configuration: Settings,
        email_client: EmailClient,
    ) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address)?;
        // Port 0 asks the OS for a random port, read back the actual one
        let port = listener.local_addr()?.port();
        let server = run(listener, email_client, configuration.environment)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Only returns when the application is stopped
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    email_client: EmailClient,
    environment: Environment,
) -> Result<Server, std::io::Error> {
    // using web::Data to wrap the client in smart pointer(Arc)
    // as App required the app_data to implement Clone trait for "T"
    let email_client = web::Data::new(email_client);
    let environment = web::Data::new(environment);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route("/health_check", web::get().to(health_check))
            .service(
                web::resource("/api/contact")
                    .wrap(cors_headers())
                    .route(web::post().to(contact))
                    .route(web::method(Method::OPTIONS).to(contact_preflight))
                    .default_service(web::to(method_not_allowed)),
            )
            .app_data(email_client.clone())
            .app_data(environment.clone())
    })
        .listen(listener)?
        .run();
    // No .await here
    Ok(server)
}

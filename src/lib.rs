pub mod configuration;
pub mod contact_client;
pub mod domain;
pub mod email_client;
pub mod email_request;
pub mod email_templates;
pub mod routes;
pub mod startup;
pub mod submission_form;
pub mod telemetry;

//! Case selector
//!
//! Each case builds a [`Configuration`] from the environment and starts a
//! client with it. Building the configuration is kept separate from starting
//! the client so the configuration can be checked on its own.

use crate::commands::Case;
use crate::common::env::{self, Environment};
use crate::common::Result;
use crate::notifier::{
    ActiveConfiguration, Client, ClientOptions, Configuration, Endpoints, Event, Veto,
};

use super::send;

pub const KEEP_MESSAGE: &str = "Don't ignore this error";
pub const IGNORE_MESSAGE: &str = "Ignore this error";
pub const CHANGE_MESSAGE: &str = "Change error message";
pub const CHANGED_MESSAGE: &str = "Error message was changed";

/// A configured client, plus whether the case already sent an error
#[derive(Debug)]
pub struct Prepared {
    pub client: Client,
    pub sent_error: bool,
}

/// API key and both endpoints from the environment
pub fn base_configuration(env: &Environment) -> Configuration {
    Configuration {
        api_key: env.get(env::API_KEY),
        endpoints: Some(Endpoints {
            notify: env.get(env::NOTIFY_ENDPOINT),
            sessions: env.get(env::SESSIONS_ENDPOINT),
        }),
        ..Default::default()
    }
}

/// The configuration a case applies
pub fn configuration_for(case: Case, env: &Environment) -> Configuration {
    match case {
        Case::Default | Case::OnBeforeNotify => base_configuration(env),
        Case::AppVersion => Configuration {
            app_version: env.non_empty(env::APP_VERSION),
            ..base_configuration(env)
        },
        Case::AppType => Configuration {
            app_type: env.non_empty(env::APP_TYPE),
            ..base_configuration(env)
        },
        Case::LegacyEndpoint => Configuration {
            api_key: env.get(env::API_KEY),
            endpoint: Some(env.get(env::NOTIFY_ENDPOINT)),
            ..Default::default()
        },
        Case::Hostname => Configuration {
            hostname: env.non_empty(env::HOSTNAME),
            ..base_configuration(env)
        },
        Case::ReleaseStage => {
            let mut config = base_configuration(env);
            if let Some(stages) = env.list(env::NOTIFY_RELEASE_STAGES) {
                config.notify_release_stages = Some(stages);
            }
            if let Some(stage) = env.non_empty(env::RELEASE_STAGE) {
                config.release_stage = Some(stage);
            }
            config
        }
        Case::ParamsFilters => {
            let mut config = base_configuration(env);
            if let Some(filters) = env.list(env::PARAMS_FILTERS) {
                config.params_filters = Some(filters);
            }
            config
        }
        Case::ProjectPackages => {
            let mut config = base_configuration(env);
            if let Some(packages) = env.list(env::PROJECT_PACKAGES) {
                config.project_packages = Some(packages);
            }
            config
        }
    }
}

/// Run a case: configure the client and perform any sends the case owns
pub async fn run(case: Case, env: &Environment, options: ClientOptions) -> Result<Prepared> {
    tracing::info!(%case, "Running case");

    let mut client = Client::configure(configuration_for(case, env), options)?;

    let sent_error = match case {
        Case::OnBeforeNotify => {
            client.on_before_notify(intercept);
            for message in [KEEP_MESSAGE, IGNORE_MESSAGE, CHANGE_MESSAGE] {
                send::log_outcome(client.notify_sync(Event::new(message)).await);
            }
            true
        }
        _ => false,
    };

    Ok(Prepared { client, sent_error })
}

/// Interception callback for the on-before-notify case
pub fn intercept(
    event: &mut Event,
    _config: &ActiveConfiguration,
) -> std::result::Result<(), Veto> {
    if event.message == IGNORE_MESSAGE {
        return Err(Veto::new("not sending errors to ignore"));
    }
    if event.message == CHANGE_MESSAGE {
        event.message = CHANGED_MESSAGE.to_string();
    }
    Ok(())
}

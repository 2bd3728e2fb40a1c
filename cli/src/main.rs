use std::sync::Arc;

use campus::backend::BackendError;
use campus::backend::supabase::SupabaseBackend;
use campus::config::{ConfigError, SupabaseConfig};
use campus::notify::ConsoleNotifier;
use campus::router::routes::{ResolvedRoute, RouteTable};
use campus::router::{Navigation, NavigationError, Router};
use campus::state::auth::{AuthError, AuthSnapshot, AuthStore};
use campus::types::{ProfileUpdate, Role};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("navigation failed: {0}")]
    Navigation(#[from] NavigationError),
    #[error("not signed in; run `campus login` first")]
    NotSignedIn,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "campus", about = "Campus school-management client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every route pattern in match order.
    Routes,
    /// Resolve a path offline against an assumed auth state.
    Resolve(ResolveArgs),
    /// Run paths through the full navigation pipeline.
    Navigate {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    Login {
        #[arg(long, env = "CAMPUS_EMAIL")]
        email: String,
        #[arg(long, env = "CAMPUS_PASSWORD")]
        password: String,
        /// Path to open after signing in.
        #[arg(long, default_value = "/")]
        goto: String,
    },
    Register(RegisterArgs),
    Logout,
    Whoami,
    /// Show the signed-in profile, updating it first when fields are given.
    Profile(ProfileArgs),
}

#[derive(Args, Debug)]
struct ResolveArgs {
    path: String,
    /// Resolve as a signed-in user with this role.
    #[arg(long, conflicts_with = "signed_in")]
    role: Option<Role>,
    /// Resolve as a signed-in user without a profile.
    #[arg(long, default_value_t = false)]
    signed_in: bool,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    full_name: String,
    #[arg(long)]
    role: Role,
    #[arg(long)]
    student_id: Option<String>,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    avatar_url: Option<String>,
    #[arg(long)]
    student_id: Option<String>,
}

impl From<ProfileArgs> for ProfileUpdate {
    fn from(args: ProfileArgs) -> Self {
        Self { full_name: args.full_name, student_id: args.student_id, phone: args.phone, avatar_url: args.avatar_url }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.command {
        Command::Routes => {
            run_routes();
            Ok(())
        }
        Command::Resolve(args) => run_resolve(&args),
        command => run_online(command).await,
    }
}

fn run_routes() {
    let table = RouteTable::default();
    for (pattern, name) in table.patterns() {
        println!("{pattern:<32} {}", name.unwrap_or("-"));
    }
}

fn run_resolve(args: &ResolveArgs) -> Result<(), CliError> {
    let auth = match (args.role, args.signed_in) {
        (Some(role), _) => AuthSnapshot::signed_in(Some(role)),
        (None, true) => AuthSnapshot::signed_in(None),
        (None, false) => AuthSnapshot::anonymous(),
    };
    let route = RouteTable::default().resolve(&args.path, &auth)?;
    let decision = campus::router::guard::decide(&route, &auth);
    let mut out = route_json(&route);
    out["guard"] = json!(format!("{decision:?}"));
    print_json(&out)
}

/// Commands that talk to the backend share one store and router.
async fn run_online(command: Command) -> Result<(), CliError> {
    let config = SupabaseConfig::from_env()?;
    let backend = SupabaseBackend::new(&config)?;
    tracing::debug!(url = %config.url, "backend configured");
    let store = AuthStore::new(Arc::new(backend), Arc::new(ConsoleNotifier));
    let router = Router::new(store.clone());

    match command {
        Command::Navigate { paths } => {
            for path in paths {
                let nav = router.navigate(&path).await?;
                print_json(&navigation_json(&path, &nav))?;
            }
            Ok(())
        }
        Command::Login { email, password, goto } => {
            store.sign_in(&email, &password).await?;
            let nav = router.navigate(&goto).await?;
            print_json(&navigation_json(&goto, &nav))
        }
        Command::Register(args) => {
            let result = store
                .sign_up(&args.email, &args.password, &args.full_name, args.role, args.student_id.as_deref())
                .await?;
            let user_id = result.user.map(|u| u.id);
            print_json(&json!({ "user_id": user_id, "confirmed": result.session.is_some() }))
        }
        Command::Logout => {
            store.initialize().await;
            if !store.is_authenticated() {
                return Err(CliError::NotSignedIn);
            }
            store.sign_out().await?;
            Ok(())
        }
        Command::Whoami => {
            store.initialize().await;
            print_json(&whoami_json(&store))
        }
        Command::Profile(args) => {
            store.initialize().await;
            if !store.is_authenticated() {
                return Err(CliError::NotSignedIn);
            }
            let changes = ProfileUpdate::from(args);
            if !changes.is_empty() {
                store.update_profile(&changes).await?;
            }
            print_json(&serde_json::to_value(store.profile())?)
        }
        Command::Routes | Command::Resolve(_) => Ok(()),
    }
}

fn route_json(route: &ResolvedRoute) -> Value {
    json!({
        "path": route.full_path,
        "pattern": route.pattern,
        "name": route.name,
        "view": route.view.map(|v| format!("{v:?}")),
        "layouts": route.layouts.iter().map(|v| format!("{v:?}")).collect::<Vec<_>>(),
        "params": route.params,
        "requires_auth": route.requires_auth(),
        "role": route.required_role(),
        "redirected_from": route.redirected_from,
    })
}

fn navigation_json(requested: &str, nav: &Navigation) -> Value {
    let hops: Vec<Value> = nav
        .hops
        .iter()
        .map(|hop| json!({ "from": hop.from, "to": hop.to, "cause": format!("{:?}", hop.cause).to_lowercase() }))
        .collect();
    json!({ "requested": requested, "route": route_json(&nav.route), "hops": hops })
}

fn whoami_json(store: &AuthStore) -> Value {
    let state = store.state();
    json!({
        "authenticated": state.is_authenticated(),
        "user_id": state.user.as_ref().map(|u| u.id),
        "email": state.user.as_ref().and_then(|u| u.email.clone()),
        "role": state.role(),
        "full_name": state.profile.as_ref().map(|p| p.full_name.clone()),
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

use std::io::{self, BufRead};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use jurisflow_api_client::{ApiClient, ApiClientConfig};
use jurisflow_client_core::auth::{normalize_base_url, resolve_api_base_url};
use jurisflow_client_core::listing::{Resource, RowAction};
use jurisflow_client_core::process::{format_display_date, processes_to_json};
use jurisflow_client_core::records::{NewDeadline, NewDocument, NewHearing, NewRecord};
use jurisflow_client_core::registration::{RegistrationForm, UserType};
use jurisflow_client_core::render::{RenderOptions, render_view};
use jurisflow_client_core::response::{ApiResponse, HttpMethod};
use jurisflow_client_core::session::{
    ClientSession, ProcessList, ProcessSource, ProcessSummaryOutcome,
};
use jurisflow_client_core::text::{layout_controls, layout_display, layout_listing, layout_view};
use jurisflow_client_core::view::ViewMode;

pub mod logging;
pub mod store;

use store::FileSessionStore;

type Session = ClientSession<ApiClient, FileSessionStore>;

pub const ENV_PASSWORD: &str = "JURISFLOW_PASSWORD";

#[derive(Parser)]
#[command(name = "jurisflow")]
#[command(about = "Terminal client for the JurisFlow legal office backend")]
pub struct JurisflowCli {
    /// Backend base URL; defaults to $JURISFLOW_API_BASE_URL or the local server.
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,
    /// Switch the response view before printing.
    #[arg(long, global = true, value_enum)]
    pub view: Option<ViewArg>,
    /// Truncate long cells at the modal width instead of the inline one.
    #[arg(long, global = true)]
    pub modal: bool,
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate and store the session token
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Register a new office account
    Register(RegisterArgs),
    /// Refresh and show the signed-in profile
    Me,
    /// Check backend health
    Health,
    /// Case documents
    #[command(subcommand)]
    Documents(DocumentsCommand),
    /// Deadlines
    #[command(subcommand)]
    Deadlines(DeadlinesCommand),
    /// Hearings
    #[command(subcommand)]
    Hearings(HearingsCommand),
    /// Case processes
    #[command(subcommand)]
    Processes(ProcessesCommand),
    /// File a demo case: one document, one deadline and one hearing
    Orchestrate,
    /// Send an arbitrary request to the backend
    Request(RequestArgs),
    /// Print the last recorded response
    Show(ShowArgs),
    /// Show which controls the current permissions unlock
    Controls,
}

#[derive(Args)]
pub struct LoginArgs {
    pub username: String,
    #[command(flatten)]
    pub password: PasswordArgs,
}

/// Where the password comes from: `--password`, then `--password-stdin`,
/// then `$JURISFLOW_PASSWORD`.
#[derive(Args)]
pub struct PasswordArgs {
    /// Visible in shell history; prefer --password-stdin or $JURISFLOW_PASSWORD.
    #[arg(long, conflicts_with = "password_stdin")]
    pub password: Option<String>,
    /// Read the password from the first line of stdin.
    #[arg(long)]
    pub password_stdin: bool,
}

impl PasswordArgs {
    fn resolve(&self) -> Result<String> {
        let from_env = std::env::var(ENV_PASSWORD).ok();
        self.resolve_from(from_env, &mut io::stdin().lock())
    }

    fn resolve_from(&self, from_env: Option<String>, stdin: &mut impl BufRead) -> Result<String> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }
        if self.password_stdin {
            let mut line = String::new();
            stdin
                .read_line(&mut line)
                .context("failed to read password from stdin")?;
            return Ok(strip_line_ending(line));
        }
        match from_env.filter(|password| !password.is_empty()) {
            Some(password) => Ok(password),
            None => bail!("password required: use --password, --password-stdin or {ENV_PASSWORD}"),
        }
    }
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub office_name: String,
    #[arg(long)]
    pub cnpj: String,
    #[arg(long)]
    pub responsible_name: String,
    #[arg(long, default_value = "")]
    pub oab_number: String,
    #[arg(long, value_parser = parse_user_type)]
    pub user_type: Option<UserType>,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub username: String,
    #[command(flatten)]
    pub password: PasswordArgs,
    /// Defaults to the password itself.
    #[arg(long)]
    pub confirm_password: Option<String>,
    #[arg(long)]
    pub accept_terms: bool,
}

impl RegisterArgs {
    fn into_form(self, password: String) -> RegistrationForm {
        let confirm_password = self.confirm_password.unwrap_or_else(|| password.clone());
        RegistrationForm {
            office_name: self.office_name,
            cnpj: self.cnpj,
            responsible_name: self.responsible_name,
            oab_number: self.oab_number,
            user_type: self.user_type,
            email: self.email,
            phone: self.phone,
            username: self.username,
            password,
            confirm_password,
            accept_terms: self.accept_terms,
        }
    }
}

#[derive(Args)]
pub struct DeleteArgs {
    pub id: String,
    /// Skip the confirmation refusal.
    #[arg(long)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum DocumentsCommand {
    List,
    Create {
        #[arg(long)]
        process_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long)]
        author: String,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
pub enum DeadlinesCommand {
    List {
        /// Only deadlines due today.
        #[arg(long)]
        today: bool,
    },
    Create {
        #[arg(long)]
        process_id: String,
        #[arg(long)]
        due_date: NaiveDate,
        #[arg(long)]
        description: String,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
pub enum HearingsCommand {
    List {
        /// Only hearings scheduled for today.
        #[arg(long)]
        today: bool,
    },
    Create {
        #[arg(long)]
        process_id: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        courtroom: String,
        #[arg(long)]
        description: String,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
pub enum ProcessesCommand {
    List,
    Summary { process_id: String },
}

#[derive(Args)]
pub struct RequestArgs {
    #[arg(value_enum)]
    pub method: MethodArg,
    pub path: String,
    /// JSON request body.
    #[arg(long)]
    pub body: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Flip between JSON and table before printing.
    #[arg(long)]
    pub toggle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewArg {
    Json,
    Table,
}

impl From<ViewArg> for ViewMode {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::Json => Self::Json,
            ViewArg::Table => Self::Table,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<MethodArg> for HttpMethod {
    fn from(value: MethodArg) -> Self {
        match value {
            MethodArg::Get => Self::Get,
            MethodArg::Post => Self::Post,
            MethodArg::Put => Self::Put,
            MethodArg::Patch => Self::Patch,
            MethodArg::Delete => Self::Delete,
        }
    }
}

pub async fn run() -> Result<()> {
    let cli = JurisflowCli::parse();
    logging::init(cli.verbose);
    execute(cli).await
}

async fn execute(cli: JurisflowCli) -> Result<()> {
    let mut session = open_session(&cli)?;
    let view = cli.view.map(ViewMode::from);

    match cli.command {
        Commands::Login(args) => {
            let password = args.password.resolve()?;
            match session.login(&args.username, &password).await? {
                Some(profile) => println!("{}", profile.summary_line()),
                None => println!("✅ Login realizado, mas o perfil não pôde ser carregado."),
            }
            Ok(())
        }
        Commands::Logout => {
            session.logout()?;
            println!("Sessão encerrada.");
            Ok(())
        }
        Commands::Register(args) => {
            let password = args.password.resolve()?;
            let outcome = session.register(&args.into_form(password)).await?;
            if outcome.logged_in {
                println!("✅ Cadastro realizado. Sessão iniciada como {}.", outcome.username);
            } else {
                println!(
                    "✅ Cadastro realizado com sucesso! Faça login como {}.",
                    outcome.username
                );
            }
            Ok(())
        }
        Commands::Me => {
            require_login(&session)?;
            match session.refresh_profile().await? {
                Some(profile) => {
                    println!("{}", profile.summary_line());
                    println!("Perfil: {}", profile.permissions.role().as_str());
                }
                None => println!("Perfil indisponível; controles protegidos ocultos."),
            }
            if let Some(expires_at) = session.token_claims().and_then(|claims| claims.expires_at) {
                println!("Token expira em: {}", format_expiry(expires_at));
            }
            Ok(())
        }
        Commands::Health => {
            let response = session.health().await?;
            print_response(&mut session, &response, view)
        }
        Commands::Documents(command) => run_documents(&mut session, command, view).await,
        Commands::Deadlines(command) => run_deadlines(&mut session, command, view).await,
        Commands::Hearings(command) => run_hearings(&mut session, command, view).await,
        Commands::Processes(command) => run_processes(&mut session, command, view).await,
        Commands::Orchestrate => {
            let today = chrono::Local::now().date_naive();
            let response = session.orchestrate(today).await?;
            print_response(&mut session, &response, view)
        }
        Commands::Request(args) => {
            let body = args
                .body
                .as_deref()
                .map(serde_json::from_str::<serde_json::Value>)
                .transpose()
                .context("--body must be valid JSON")?;
            let response = session
                .hit(args.method.into(), &args.path, body.as_ref())
                .await?;
            print_response(&mut session, &response, view)
        }
        Commands::Show(args) => {
            if args.toggle {
                session.toggle_view()?;
            } else if let Some(mode) = view {
                session.set_view_mode(mode)?;
            }
            match session.display() {
                Some(display) => println!("{}", layout_display(&display)),
                None => println!("Nenhuma resposta registrada."),
            }
            Ok(())
        }
        Commands::Controls => {
            println!("{}", layout_controls(&session.controls()));
            Ok(())
        }
    }
}

fn open_session(cli: &JurisflowCli) -> Result<Session> {
    let base_url = match cli.base_url.as_deref() {
        Some(raw) => normalize_base_url(raw)?,
        None => {
            let (base_url, source) = resolve_api_base_url()?;
            tracing::debug!(base_url = %base_url, source, "resolved api base url");
            base_url
        }
    };
    let mut config = ApiClientConfig::new(base_url);
    config.timeout_ms = cli.timeout_ms;
    let client = ApiClient::new(config)?;

    let store = FileSessionStore::from_env();
    tracing::debug!(path = %store.path().display(), "session store");
    let options = if cli.modal {
        RenderOptions::modal()
    } else {
        RenderOptions::inline()
    };
    let mut session = ClientSession::new(client, store).with_render_options(options);
    session.restore()?;
    Ok(session)
}

async fn run_documents(
    session: &mut Session,
    command: DocumentsCommand,
    view: Option<ViewMode>,
) -> Result<()> {
    match command {
        DocumentsCommand::List => list(session, Resource::Documents, None).await,
        DocumentsCommand::Create {
            process_id,
            title,
            content,
            author,
        } => {
            let record = NewDocument::new(&process_id, &title, &content, &author)?;
            create(session, &NewRecord::Document(record), view).await
        }
        DocumentsCommand::Delete(args) => delete(session, Resource::Documents, &args, view).await,
    }
}

async fn run_deadlines(
    session: &mut Session,
    command: DeadlinesCommand,
    view: Option<ViewMode>,
) -> Result<()> {
    match command {
        DeadlinesCommand::List { today } => {
            list(session, Resource::Deadlines, today_if(today)).await
        }
        DeadlinesCommand::Create {
            process_id,
            due_date,
            description,
        } => {
            let record = NewDeadline::new(&process_id, due_date, &description)?;
            create(session, &NewRecord::Deadline(record), view).await
        }
        DeadlinesCommand::Delete(args) => delete(session, Resource::Deadlines, &args, view).await,
    }
}

async fn run_hearings(
    session: &mut Session,
    command: HearingsCommand,
    view: Option<ViewMode>,
) -> Result<()> {
    match command {
        HearingsCommand::List { today } => list(session, Resource::Hearings, today_if(today)).await,
        HearingsCommand::Create {
            process_id,
            date,
            courtroom,
            description,
        } => {
            let record = NewHearing::new(&process_id, date, &courtroom, &description)?;
            create(session, &NewRecord::Hearing(record), view).await
        }
        HearingsCommand::Delete(args) => delete(session, Resource::Hearings, &args, view).await,
    }
}

async fn run_processes(
    session: &mut Session,
    command: ProcessesCommand,
    view: Option<ViewMode>,
) -> Result<()> {
    match command {
        ProcessesCommand::List => {
            let list = session.list_processes().await?;
            println!("{}", layout_process_list(&list));
            Ok(())
        }
        ProcessesCommand::Summary { process_id } => {
            let outcome = session.process_summary(&process_id).await?;
            if outcome.response.ok {
                println!("{}", layout_summary(&outcome));
                Ok(())
            } else {
                print_response(session, &outcome.response, view)
            }
        }
    }
}

async fn list(session: &mut Session, resource: Resource, on: Option<NaiveDate>) -> Result<()> {
    let response = match on {
        Some(date) => session.list_on(resource, date).await?,
        None => session.list(resource).await?,
    };
    print_message(&response);
    if response.ok {
        println!("{}", layout_listing(&session.render_listing(resource, &response.data)));
        Ok(())
    } else {
        print_response(session, &response, None)
    }
}

async fn create(session: &mut Session, record: &NewRecord, view: Option<ViewMode>) -> Result<()> {
    let response = session.create(record).await?;
    print_response(session, &response, view)
}

async fn delete(
    session: &mut Session,
    resource: Resource,
    args: &DeleteArgs,
    view: Option<ViewMode>,
) -> Result<()> {
    if !args.yes {
        bail!("{} Repita com --yes para confirmar.", delete_confirmation(resource, &args.id));
    }
    let response = session.delete(resource, &args.id).await?;
    print_response(session, &response, view)
}

fn print_response(
    session: &mut Session,
    response: &ApiResponse,
    view: Option<ViewMode>,
) -> Result<()> {
    print_message(response);
    if let Some(mode) = view {
        session.set_view_mode(mode)?;
    }
    if let Some(display) = session.display() {
        println!("{}", layout_display(&display));
    }
    Ok(())
}

fn print_message(response: &ApiResponse) {
    if let Some(message) = response.friendly_message.as_deref() {
        println!("{message}");
    }
}

fn require_login(session: &Session) -> Result<()> {
    if session.is_authenticated() {
        Ok(())
    } else {
        bail!("Nenhuma sessão ativa. Execute `jurisflow login` primeiro.")
    }
}

fn today_if(enabled: bool) -> Option<NaiveDate> {
    enabled.then(|| chrono::Local::now().date_naive())
}

fn delete_confirmation(resource: Resource, id: &str) -> String {
    let action = RowAction {
        item_id: id.trim().to_string(),
        path: resource.item_path(id),
        description: format!("{} {}", capitalize(resource.noun()), id.trim()),
    };
    action.confirmation(resource)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn layout_process_list(list: &ProcessList) -> String {
    let source = match list.source {
        ProcessSource::Endpoint => "Processos",
        ProcessSource::Aggregated => "Processos (agregados de documentos, prazos e audiências)",
    };
    let entries = list
        .entries
        .iter()
        .cloned()
        .map(|mut entry| {
            entry.created_at = entry
                .created_at
                .map(|raw| format_display_date(&raw, true));
            entry
        })
        .collect::<Vec<_>>();
    let body = render_view(&processes_to_json(&entries), &RenderOptions::modal())
        .map_or_else(|| "Nenhum processo encontrado".to_string(), |view| layout_view(&view));
    format!("{source}\n\n{body}")
}

fn layout_summary(outcome: &ProcessSummaryOutcome) -> String {
    let summary = &outcome.summary;
    if summary.is_empty() {
        return format!("Processo {}: nenhum registro vinculado.", outcome.process_id);
    }
    format!(
        "Processo {}\n📄 Documentos: {}\n⏰ Prazos: {}\n⚖️ Audiências: {}",
        outcome.process_id,
        summary.documents.len(),
        summary.deadlines.len(),
        summary.hearings.len()
    )
}

fn format_expiry(expires_at: i64) -> String {
    chrono::DateTime::from_timestamp(expires_at, 0)
        .map_or_else(|| expires_at.to_string(), |moment| moment.to_rfc3339())
}

fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

fn parse_user_type(raw: &str) -> Result<UserType, String> {
    UserType::parse(raw).ok_or_else(|| format!("unknown user type `{raw}` (advogado|estagiario)"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn cli_requires_subcommand() {
        let err = match JurisflowCli::try_parse_from(["jurisflow"]) {
            Ok(_) => panic!("expected missing subcommand parse error"),
            Err(err) => err,
        };
        assert_eq!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn cli_rejects_unknown_subcommand() {
        let err = match JurisflowCli::try_parse_from(["jurisflow", "unknown-subcommand"]) {
            Ok(_) => panic!("expected invalid subcommand parse error"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = JurisflowCli::try_parse_from([
            "jurisflow",
            "hearings",
            "list",
            "--today",
            "--view",
            "table",
            "--base-url",
            "http://localhost:8000",
        ])
        .expect("parse");
        assert_eq!(cli.view, Some(ViewArg::Table));
        assert_eq!(cli.base_url.as_deref(), Some("http://localhost:8000"));
        assert!(matches!(
            cli.command,
            Commands::Hearings(HearingsCommand::List { today: true })
        ));
    }

    #[test]
    fn deadline_dates_are_parsed() {
        let cli = JurisflowCli::try_parse_from([
            "jurisflow",
            "deadlines",
            "create",
            "--process-id",
            "P-1",
            "--due-date",
            "2026-11-15",
            "--description",
            "Contestação",
        ])
        .expect("parse");
        let Commands::Deadlines(DeadlinesCommand::Create { due_date, .. }) = cli.command else {
            panic!("expected deadline create");
        };
        assert_eq!(due_date, NaiveDate::from_ymd_opt(2026, 11, 15).expect("date"));

        let err = match JurisflowCli::try_parse_from([
            "jurisflow",
            "deadlines",
            "create",
            "--process-id",
            "P-1",
            "--due-date",
            "15/11/2026",
            "--description",
            "x",
        ]) {
            Ok(_) => panic!("expected invalid date"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn documents_have_no_today_filter() {
        let args = ["jurisflow", "documents", "list", "--today"];
        let err = match JurisflowCli::try_parse_from(args) {
            Ok(_) => panic!("expected unknown argument"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn register_accepts_user_type_aliases() {
        let cli = JurisflowCli::try_parse_from([
            "jurisflow",
            "register",
            "--office-name",
            "Silva Advogados",
            "--cnpj",
            "12.345.678/0001-90",
            "--responsible-name",
            "Ana Silva",
            "--user-type",
            "estagiário",
            "--email",
            "ana@silva.adv.br",
            "--phone",
            "11999990000",
            "--username",
            "ana",
            "--password",
            "segredo123",
            "--accept-terms",
        ])
        .expect("parse");
        let Commands::Register(args) = cli.command else {
            panic!("expected register");
        };
        let password = args.password.resolve_from(None, &mut io::empty()).expect("password");
        let form = args.into_form(password);
        assert_eq!(form.confirm_password, "segredo123");
        assert_eq!(form.user_type, Some(UserType::Estagiario));
        assert!(form.accept_terms);
        assert!(form.validate().is_ok());
    }

    fn login_password(args: &[&str]) -> PasswordArgs {
        let cli = JurisflowCli::try_parse_from(args.iter().copied()).expect("parse");
        let Commands::Login(login) = cli.command else {
            panic!("expected login");
        };
        login.password
    }

    #[test]
    fn password_flag_wins_over_env() {
        let password = login_password(&["jurisflow", "login", "ana", "--password", " s3nha "]);
        let resolved = password
            .resolve_from(Some("from-env".to_string()), &mut io::empty())
            .expect("password");
        assert_eq!(resolved, " s3nha ");
    }

    #[test]
    fn password_stdin_keeps_spaces_and_drops_newline() {
        let password = login_password(&["jurisflow", "login", "ana", "--password-stdin"]);
        let mut stdin = io::Cursor::new(" s3nha \r\nsegunda linha\n");
        let resolved = password
            .resolve_from(Some("from-env".to_string()), &mut stdin)
            .expect("password");
        assert_eq!(resolved, " s3nha ");
    }

    #[test]
    fn password_falls_back_to_env() {
        let password = login_password(&["jurisflow", "login", "ana"]);
        let resolved = password
            .resolve_from(Some("from-env".to_string()), &mut io::empty())
            .expect("password");
        assert_eq!(resolved, "from-env");

        let missing = password.resolve_from(Some(String::new()), &mut io::empty());
        let message = missing.expect_err("no password").to_string();
        assert!(message.contains(ENV_PASSWORD));
    }

    #[test]
    fn password_flag_conflicts_with_stdin() {
        let err = match JurisflowCli::try_parse_from([
            "jurisflow",
            "login",
            "ana",
            "--password",
            "x",
            "--password-stdin",
        ]) {
            Ok(_) => panic!("expected conflict"),
            Err(err) => err,
        };
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn request_method_maps_to_http_method() {
        let cli = JurisflowCli::try_parse_from([
            "jurisflow",
            "request",
            "patch",
            "/api/documents/1",
            "--body",
            r#"{"title":"Nova"}"#,
        ])
        .expect("parse");
        let Commands::Request(args) = cli.command else {
            panic!("expected request");
        };
        assert_eq!(HttpMethod::from(args.method), HttpMethod::Patch);
    }

    #[test]
    fn delete_confirmation_names_the_item() {
        let message = delete_confirmation(Resource::Hearings, " 42 ");
        assert!(message.starts_with("Deseja excluir este audiência?"));
        assert!(message.contains("Audiência 42 será excluído permanentemente"));
    }

    #[test]
    fn expiry_renders_as_rfc3339() {
        assert_eq!(format_expiry(0), "1970-01-01T00:00:00+00:00");
    }
}

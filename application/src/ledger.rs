//! Entry points for the hosting runtime: operations arrive by name with
//! positional string arguments and are routed to the services.

use crate::{
    ApplicationError, IndexManager, KeyValueStore, LedgerConfig, PersonnelRequest,
    PersonnelService, ProjectService,
};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

/// Key written by [`Ledger::init`].
pub const INIT_KEY: &str = "abc";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InvokeFunction {
    Write,
    AddEmployee,
    UpdateEmployee,
    CreateProject,
    AddProjectMember,
    DeleteProjectMember,
}

impl FromStr for InvokeFunction {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "write" => Ok(InvokeFunction::Write),
            "add_employee" => Ok(InvokeFunction::AddEmployee),
            "update_employee" => Ok(InvokeFunction::UpdateEmployee),
            "create_project" => Ok(InvokeFunction::CreateProject),
            "add_project_member" => Ok(InvokeFunction::AddProjectMember),
            "delete_project_member" => Ok(InvokeFunction::DeleteProjectMember),
            _ => Err(ApplicationError::UnknownFunction("invocation".to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryFunction {
    Read,
}

impl FromStr for QueryFunction {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(QueryFunction::Read),
            _ => Err(ApplicationError::UnknownFunction("query".to_string())),
        }
    }
}

/// Routes named operations to the personnel and project services.
///
/// Every entry point holds the invocation gate for its whole run, so the
/// reads and writes of one invocation never interleave with another's.
pub struct Ledger {
    store: Arc<dyn KeyValueStore>,
    personnel: PersonnelService,
    projects: ProjectService,
    gate: Mutex<()>,
}

impl Ledger {
    pub fn new(store: Arc<dyn KeyValueStore>, config: LedgerConfig) -> Self {
        let indices = IndexManager::new(store.clone());
        Self {
            personnel: PersonnelService::new(store.clone(), indices.clone(), config),
            projects: ProjectService::new(store.clone(), indices, config),
            store,
            gate: Mutex::new(()),
        }
    }

    /// Direct service access; calls made here bypass the invocation gate.
    pub fn personnel(&self) -> &PersonnelService {
        &self.personnel
    }

    /// Direct service access; calls made here bypass the invocation gate.
    pub fn projects(&self) -> &ProjectService {
        &self.projects
    }

    /// Deployment-time initialisation: one integer argument, stored at [`INIT_KEY`].
    #[instrument(skip(self))]
    pub async fn init(&self, args: &[String]) -> Result<(), ApplicationError> {
        let _guard = self.gate.lock().await;
        expect_args(args, 1)?;
        let value = args[0].parse::<i64>().map_err(|_| {
            warn!(arg = %args[0], "Init value is not an integer");
            ApplicationError::InvalidArgument(
                "Expecting integer value for asset holding".to_string(),
            )
        })?;
        self.store.put(INIT_KEY, value.to_string().as_bytes()).await?;
        info!(value, "Ledger initialised");
        Ok(())
    }

    /// Runs one mutating operation. Success carries no payload.
    #[instrument(skip(self, args), fields(argc = args.len()))]
    pub async fn invoke(&self, function: &str, args: &[String]) -> Result<(), ApplicationError> {
        info!("invoke is running {}", function);
        let operation = function.parse::<InvokeFunction>().map_err(|e| {
            warn!("invoke did not find func: {}", function);
            e
        })?;

        let _guard = self.gate.lock().await;
        let result = self.dispatch(operation, args).await;

        if let Err(e) = &result {
            error!(function = %function, "Invocation failed: {}", e);
        }
        result
    }

    async fn dispatch(
        &self,
        operation: InvokeFunction,
        args: &[String],
    ) -> Result<(), ApplicationError> {
        match operation {
            InvokeFunction::Write => self.write(args).await,
            InvokeFunction::AddEmployee => {
                self.personnel.add_personnel(&personnel_request(args)?).await
            }
            InvokeFunction::UpdateEmployee => {
                self.personnel
                    .update_personnel(&personnel_request(args)?)
                    .await
            }
            InvokeFunction::CreateProject => {
                expect_args(args, 1)?;
                self.projects.create_project(&args[0]).await.map(|_| ())
            }
            InvokeFunction::AddProjectMember => {
                if args.len() < 2 {
                    return Err(ApplicationError::InvalidArgument(
                        "Incorrect number of arguments. Expecting 2 or more".to_string(),
                    ));
                }
                self.projects
                    .add_project_members(&args[0], &args[1..])
                    .await
            }
            InvokeFunction::DeleteProjectMember => {
                expect_args(args, 2)?;
                self.projects
                    .remove_project_member(&args[0], &args[1])
                    .await
            }
        }
    }

    /// Runs one read-only operation and returns its raw payload.
    #[instrument(skip(self, args), fields(argc = args.len()))]
    pub async fn query(&self, function: &str, args: &[String]) -> Result<Vec<u8>, ApplicationError> {
        info!("query is running {}", function);
        let operation = function.parse::<QueryFunction>().map_err(|e| {
            warn!("query did not find func: {}", function);
            e
        })?;

        let _guard = self.gate.lock().await;
        match operation {
            QueryFunction::Read => self.read(args).await,
        }
    }

    async fn write(&self, args: &[String]) -> Result<(), ApplicationError> {
        if args.len() != 2 {
            return Err(ApplicationError::InvalidArgument(
                "Incorrect number of arguments. Expecting 2. name of the variable and value to set"
                    .to_string(),
            ));
        }
        self.store.put(&args[0], args[1].as_bytes()).await
    }

    /// Raw bytes at the key, verbatim; an unset key reads as empty.
    async fn read(&self, args: &[String]) -> Result<Vec<u8>, ApplicationError> {
        if args.len() != 1 {
            return Err(ApplicationError::InvalidArgument(
                "Incorrect number of arguments. Expecting name of the var to query".to_string(),
            ));
        }
        let key = &args[0];
        match self.store.get(key).await {
            Ok(value) => Ok(value.unwrap_or_default()),
            Err(e) => {
                error!(key = %key, "Failed to get state: {}", e);
                Err(ApplicationError::NotFound(
                    serde_json::json!({ "Error": format!("Failed to get state for {}", key) })
                        .to_string(),
                ))
            }
        }
    }
}

fn expect_args(args: &[String], expected: usize) -> Result<(), ApplicationError> {
    if args.len() != expected {
        return Err(ApplicationError::InvalidArgument(format!(
            "Incorrect number of arguments. Expecting {}",
            expected
        )));
    }
    Ok(())
}

fn personnel_request(args: &[String]) -> Result<PersonnelRequest, ApplicationError> {
    PersonnelRequest::from_args(args).ok_or_else(|| {
        ApplicationError::InvalidArgument("Incorrect number of arguments. Expecting 5".to_string())
    })
}

//! Core crudhaus engine
//!
//! [`Crudhaus`] holds one merged [`RequestConfig`] per registered request type
//! plus the collaborators every handler shares. It is built once through
//! [`CrudhausBuilder`] and only read afterwards, so one instance can serve
//! concurrent requests.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use config::{AppConfig, PipelineConfig};
use hook_system::{RequestContext, SignalManager};
use object_mapping::{ObjectMapper, SerdeMapper};
use sqlx::PgPool;
use store_object::{connect_pool, DataContext, StoreError};

use crate::errors::CrudError;
use crate::handlers::{self, Pipeline};
use crate::profile::{Profile, ProfileRegistry};
use crate::request::{CrudRequest, ItemRequest, ItemsRequest, PagedRequest, RequestShape};
use crate::request_config::RequestConfig;
use crate::response::{PagedResult, Response, ResponseError};
use crate::validation::{validate_all, Validator};

type ErasedConfig = Box<dyn Any + Send + Sync>;
type ConfigBuilder = fn(&ProfileRegistry) -> Result<ErasedConfig, CrudError>;

fn build_config<R: CrudRequest>(registry: &ProfileRegistry) -> Result<ErasedConfig, CrudError> {
    Ok(Box::new(registry.build::<R>()?))
}

/// Collects profiles, request types and collaborators
pub struct CrudhausBuilder {
    registry: ProfileRegistry,
    requests: Vec<(TypeId, &'static str, ConfigBuilder)>,
    validators: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    mapper: Option<Arc<dyn ObjectMapper>>,
    signals: Option<Arc<SignalManager>>,
    defaults: PipelineConfig,
}

impl Default for CrudhausBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CrudhausBuilder {
    pub fn new() -> Self {
        Self {
            registry: ProfileRegistry::new(),
            requests: Vec::new(),
            validators: HashMap::new(),
            mapper: None,
            signals: None,
            defaults: PipelineConfig::default(),
        }
    }

    /// Builder with the pipeline defaults of a loaded [`AppConfig`]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new().defaults(config.pipeline.clone())
    }

    pub fn profile<R, E>(mut self, profile: Profile<R, E>) -> Self
    where
        R: ?Sized + Sync + 'static,
        E: ?Sized + Send + 'static,
    {
        self.registry.add(profile);
        self
    }

    /// Register a request type; its configuration is merged in [`build`](Self::build)
    pub fn handle<R: CrudRequest>(mut self) -> Self {
        let type_id = TypeId::of::<R>();
        if !self.requests.iter().any(|(id, _, _)| *id == type_id) {
            self.requests
                .push((type_id, type_name::<R>(), build_config::<R>));
        }
        self
    }

    pub fn validator<R, V>(mut self, validator: V) -> Self
    where
        R: CrudRequest,
        V: Validator<R> + 'static,
    {
        let slot = self
            .validators
            .entry(TypeId::of::<R>())
            .or_insert_with(|| Box::new(Vec::<Arc<dyn Validator<R>>>::new()));
        if let Some(validators) = slot.downcast_mut::<Vec<Arc<dyn Validator<R>>>>() {
            validators.push(Arc::new(validator));
        }
        self
    }

    pub fn mapper<M: ObjectMapper + 'static>(mut self, mapper: M) -> Self {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    pub fn signals(mut self, signals: Arc<SignalManager>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn defaults(mut self, defaults: PipelineConfig) -> Self {
        self.defaults = defaults;
        self
    }

    /// Merge the configuration of every registered request type
    ///
    /// Fails with [`CrudError::BadConfiguration`] when a profile does not fit
    /// its request type or a request type has no way to select its entities.
    pub fn build(self) -> Result<Crudhaus, CrudError> {
        let mut configs = HashMap::with_capacity(self.requests.len());
        for (type_id, name, build) in &self.requests {
            crate::debug_log!("Building configuration for {}", name);
            let config = build(&self.registry).map_err(|e| {
                tracing::error!(request = *name, "invalid request configuration: {}", e);
                e
            })?;
            configs.insert(*type_id, config);
        }

        tracing::debug!(
            requests = configs.len(),
            profiles = self.registry.len(),
            "crudhaus engine built"
        );

        Ok(Crudhaus {
            configs,
            validators: self.validators,
            mapper: self
                .mapper
                .unwrap_or_else(|| Arc::new(SerdeMapper::new())),
            signals: self.signals,
            defaults: self.defaults,
        })
    }
}

enum Prepared<'a, R: CrudRequest> {
    Ready(Pipeline<'a, R>),
    Invalid(Vec<ResponseError>),
}

/// Dispatch a request to `$handler` once it passed validation
macro_rules! dispatch {
    ($engine:ident, $request:ident, $data:ident, $ctx:ident, $shape:expr, $handler:path) => {
        match $engine.prepare($request, $data, $ctx, $shape)? {
            Prepared::Invalid(errors) => Ok(Response::failure(errors)),
            Prepared::Ready(pipeline) => {
                let outcome = $handler(&pipeline).await;
                pipeline.finish(outcome).await
            }
        }
    };
}

/// Request executor over merged configurations
pub struct Crudhaus {
    configs: HashMap<TypeId, ErasedConfig>,
    validators: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    mapper: Arc<dyn ObjectMapper>,
    signals: Option<Arc<SignalManager>>,
    defaults: PipelineConfig,
}

impl std::fmt::Debug for Crudhaus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crudhaus")
            .field("requests", &self.configs.len())
            .field("signals", &self.signals.is_some())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl Crudhaus {
    pub fn builder() -> CrudhausBuilder {
        CrudhausBuilder::new()
    }

    /// Merged configuration of `R`
    pub fn config<R: CrudRequest>(&self) -> Result<&RequestConfig<R>, CrudError> {
        self.configs
            .get(&TypeId::of::<R>())
            .and_then(|config| config.downcast_ref::<RequestConfig<R>>())
            .ok_or_else(|| {
                CrudError::bad_configuration(format!(
                    "request type {} is not registered",
                    type_name::<R>()
                ))
            })
    }

    pub fn is_registered<R: CrudRequest>(&self) -> bool {
        self.configs.contains_key(&TypeId::of::<R>())
    }

    pub fn mapper(&self) -> &dyn ObjectMapper {
        self.mapper.as_ref()
    }

    pub fn signals(&self) -> Option<&Arc<SignalManager>> {
        self.signals.as_ref()
    }

    pub fn defaults(&self) -> &PipelineConfig {
        &self.defaults
    }

    fn validate<R: CrudRequest>(&self, request: &R) -> Vec<ResponseError> {
        self.validators
            .get(&TypeId::of::<R>())
            .and_then(|slot| slot.downcast_ref::<Vec<Arc<dyn Validator<R>>>>())
            .map(|validators| validate_all(validators, request))
            .unwrap_or_default()
    }

    fn prepare<'a, R: CrudRequest>(
        &'a self,
        request: &'a R,
        data: &'a dyn DataContext,
        ctx: &'a RequestContext,
        shape: RequestShape,
    ) -> Result<Prepared<'a, R>, CrudError> {
        if R::SHAPE != shape {
            return Err(CrudError::bad_configuration(format!(
                "{} is a {:?} request, not {:?}",
                type_name::<R>(),
                R::SHAPE,
                shape
            )));
        }

        tracing::debug!(
            request = type_name::<R>(),
            shape = ?shape,
            request_id = %ctx.request_id(),
            "handling request"
        );

        let errors = self.validate(request);
        if !errors.is_empty() {
            tracing::debug!(
                request = type_name::<R>(),
                failures = errors.len(),
                "request failed validation"
            );
            return Ok(Prepared::Invalid(errors));
        }

        let config = self.config::<R>()?;
        Ok(Prepared::Ready(Pipeline {
            request,
            config,
            data,
            ctx,
            mapper: self.mapper.as_ref(),
            signals: self.signals.as_deref(),
            settings: config.options.resolve(&self.defaults),
        }))
    }

    pub async fn create<R: ItemRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<R::Output>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::Create, handlers::create)
    }

    pub async fn create_all<R: ItemsRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<Vec<R::Output>>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::CreateAll, handlers::create_all)
    }

    pub async fn get<R: CrudRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<R::Output>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::Get, handlers::get)
    }

    pub async fn get_all<R: CrudRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<Vec<R::Output>>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::GetAll, handlers::get_all)
    }

    pub async fn paged_get_all<R: PagedRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<PagedResult<R::Output>>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::PagedGetAll, handlers::paged_get_all)
    }

    pub async fn update<R: ItemRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<R::Output>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::Update, handlers::update)
    }

    pub async fn update_all<R: ItemsRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<Vec<R::Output>>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::UpdateAll, handlers::update_all)
    }

    pub async fn delete<R: CrudRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<R::Output>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::Delete, handlers::delete)
    }

    pub async fn delete_all<R: CrudRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<Vec<R::Output>>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::DeleteAll, handlers::delete_all)
    }

    pub async fn save<R: ItemRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<R::Output>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::Save, handlers::save)
    }

    pub async fn merge<R: ItemsRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<Vec<R::Output>>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::Merge, handlers::merge)
    }

    pub async fn synchronize<R: ItemsRequest>(
        &self,
        request: &R,
        data: &dyn DataContext,
        ctx: &RequestContext,
    ) -> Result<Response<Vec<R::Output>>, CrudError> {
        dispatch!(self, request, data, ctx, RequestShape::Synchronize, handlers::synchronize)
    }
}

/// Open and probe the pool described by the `[database]` section of `config`
pub async fn connect_database(config: &AppConfig) -> Result<PgPool, CrudError> {
    let database = config
        .database
        .as_ref()
        .ok_or_else(|| CrudError::bad_configuration("no [database] section configured"))?;

    let pool = connect_pool(database).await?;
    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await
        .map_err(|e| StoreError::database_operation(&database.database, "health_check", e))?;

    tracing::info!(
        host = %database.host,
        database = %database.database,
        max_connections = database.max_connections,
        "database pool ready"
    );
    Ok(pool)
}

//! Session façade.

use crate::{
    MapRowMapper, QueryItem, RowMap, RowMapper, ScalarRowMapper, SessionConfig, SessionError,
    SessionResult, TransactionScope,
};
use std::collections::HashMap;
use strand_core::{EntityRef, GraphModel, GraphRowModel, Properties, QueryStatistics, Value};
use strand_cypher::{
    check_not_empty, check_nothing_returned, check_read_only, AggregateStatements, Filter,
    NodeStatements, Statement, StatementStrategy,
};
use strand_mapping::{GraphMapper, GraphReader, MappingContext, ReadResult};
use strand_metadata::{EntityDescriptor, MetaData};
use strand_request::{RequestHandler, StatementResult, Transport};
use strand_transaction::{Transaction, TransactionManager};
use tracing::{debug, info};

/// A mapping session.
///
/// A session owns its transport, its mapping context and its transaction
/// state. Objects it hands out are shared handles; loading an identity the
/// session already tracks returns the tracked object.
pub struct Session<'m, T: Transport> {
    metadata: &'m MetaData,
    transport: T,
    context: MappingContext,
    transactions: TransactionManager,
    /// Statement strategy per type name.
    strategies: HashMap<String, StatementStrategy>,
    config: SessionConfig,
}

impl<'m, T: Transport> Session<'m, T> {
    /// Create a new session with the default configuration.
    pub fn new(metadata: &'m MetaData, transport: T) -> Self {
        Self::with_config(metadata, transport, SessionConfig::default())
    }

    /// Create a new session.
    pub fn with_config(metadata: &'m MetaData, transport: T, config: SessionConfig) -> Self {
        Self {
            metadata,
            transport,
            context: MappingContext::new(),
            transactions: TransactionManager::new(config.base_url.clone()),
            strategies: HashMap::new(),
            config,
        }
    }

    pub fn metadata(&self) -> &'m MetaData {
        self.metadata
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the mapping context.
    pub fn context(&self) -> &MappingContext {
        &self.context
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // ==================== Load ====================

    /// Load an object by identity at the configured depth.
    pub fn load(&mut self, type_name: &str, id: i64) -> SessionResult<Option<EntityRef>> {
        let depth = self.config.load_depth;
        self.load_with_depth(type_name, id, depth)
    }

    /// Load an object by identity, with its neighbourhood to `depth` hops.
    pub fn load_with_depth(
        &mut self,
        type_name: &str,
        id: i64,
        depth: i32,
    ) -> SessionResult<Option<EntityRef>> {
        let descriptor = match self.descriptor(type_name) {
            Some(descriptor) => descriptor,
            None => return Ok(None),
        };
        let statement = self.strategy(descriptor).queries().find_one(id, depth);
        Ok(self.fetch_graph(&statement)?.by_id(descriptor, id))
    }

    /// Load objects by identity, in the order of `ids`. Missing ones are skipped.
    pub fn load_all_by_ids(
        &mut self,
        type_name: &str,
        ids: &[i64],
        depth: i32,
    ) -> SessionResult<Vec<EntityRef>> {
        let descriptor = match self.descriptor(type_name) {
            Some(descriptor) => descriptor,
            None => return Ok(Vec::new()),
        };
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let statement = self.strategy(descriptor).queries().find_all(ids, depth);
        let result = self.fetch_graph(&statement)?;
        Ok(ids.iter().filter_map(|&id| result.by_id(descriptor, id)).collect())
    }

    /// Load every object of a type at the configured depth.
    pub fn load_all(&mut self, type_name: &str) -> SessionResult<Vec<EntityRef>> {
        let depth = self.config.load_depth;
        self.load_all_with_depth(type_name, depth)
    }

    pub fn load_all_with_depth(&mut self, type_name: &str, depth: i32) -> SessionResult<Vec<EntityRef>> {
        let descriptor = match self.descriptor(type_name) {
            Some(descriptor) => descriptor,
            None => return Ok(Vec::new()),
        };
        let statement = self
            .strategy(descriptor)
            .queries()
            .find_by_type(descriptor.entity_type(), depth);
        Ok(self.fetch_graph(&statement)?.of_type(descriptor))
    }

    /// Reload objects of one type by their identities.
    ///
    /// Objects without identity are ignored; an empty input makes no request.
    pub fn reload_all(&mut self, objects: &[EntityRef], depth: i32) -> SessionResult<Vec<EntityRef>> {
        let first = match objects.first() {
            Some(first) => first,
            None => return Ok(Vec::new()),
        };
        let type_name = first.borrow().type_name();
        let ids: Vec<i64> = objects.iter().filter_map(|o| o.borrow().id()).collect();
        self.load_all_by_ids(type_name, &ids, depth)
    }

    /// Load objects matching one property filter.
    pub fn load_by_property(
        &mut self,
        type_name: &str,
        filter: Filter,
        depth: i32,
    ) -> SessionResult<Vec<EntityRef>> {
        self.load_by_properties(type_name, &[filter], depth)
    }

    /// Load objects matching property filters, in result order.
    pub fn load_by_properties(
        &mut self,
        type_name: &str,
        filters: &[Filter],
        depth: i32,
    ) -> SessionResult<Vec<EntityRef>> {
        let descriptor = match self.descriptor(type_name) {
            Some(descriptor) => descriptor,
            None => return Ok(Vec::new()),
        };
        let resolved = filters
            .iter()
            .map(|filter| filter.resolve(descriptor, self.metadata))
            .collect::<Result<Vec<_>, _>>()?;
        let statement = self.strategy(descriptor).queries().find_by_properties(
            descriptor.entity_type(),
            &resolved,
            depth,
        )?;

        let url = self.transactions.target_url();
        let rows: Vec<GraphRowModel> = self.handler().graph_rows(&url, &statement)?.collect();

        // The second column carries the id of the matched root.
        let mut roots: Vec<i64> = Vec::new();
        for row in &rows {
            if let Some(id) = row.row.get(1).and_then(Value::as_int) {
                if !roots.contains(&id) {
                    roots.push(id);
                }
            }
        }
        let result = self.read_graphs(rows.into_iter().map(|row| row.graph));
        Ok(roots.into_iter().filter_map(|id| result.by_id(descriptor, id)).collect())
    }

    // ==================== Query ====================

    /// Run a read-only statement, returning each row as a column map.
    pub fn query(&mut self, cypher: &str, parameters: Properties) -> SessionResult<Vec<RowMap>> {
        check_not_empty(cypher).map_err(SessionError::usage)?;
        check_read_only(cypher).map_err(SessionError::usage)?;
        self.map_rows(Statement::new(cypher, parameters), &MapRowMapper)
    }

    /// Run a read-only statement for a result type.
    ///
    /// A mapped type is rebuilt from graph results; anything else is read from
    /// single-column rows.
    pub fn query_for(
        &mut self,
        type_name: &str,
        cypher: &str,
        parameters: Properties,
    ) -> SessionResult<Vec<QueryItem<Value>>> {
        self.query_with(type_name, cypher, parameters, &ScalarRowMapper)
    }

    /// Run a read-only statement, mapping rows of unmapped types with `mapper`.
    pub fn query_with<M: RowMapper>(
        &mut self,
        type_name: &str,
        cypher: &str,
        parameters: Properties,
        mapper: &M,
    ) -> SessionResult<Vec<QueryItem<M::Output>>> {
        if type_name.trim().is_empty() {
            return Err(SessionError::InvalidType);
        }
        check_not_empty(cypher).map_err(SessionError::usage)?;
        check_read_only(cypher).map_err(SessionError::usage)?;

        match self.metadata.descriptor(type_name) {
            Some(descriptor) => {
                let result = self.fetch_graph(&Statement::graph(cypher, parameters))?;
                Ok(result.of_type(descriptor).into_iter().map(QueryItem::Entity).collect())
            }
            None => Ok(self
                .map_rows(Statement::new(cypher, parameters), mapper)?
                .into_iter()
                .map(QueryItem::Value)
                .collect()),
        }
    }

    /// Run a read-only statement expected to produce at most one result.
    pub fn query_for_object(
        &mut self,
        type_name: &str,
        cypher: &str,
        parameters: Properties,
    ) -> SessionResult<Option<QueryItem<Value>>> {
        let mut results = self.query_for(type_name, cypher, parameters)?;
        match results.len() {
            0 | 1 => Ok(results.pop()),
            actual => Err(SessionError::incorrect_result_size(1, actual)),
        }
    }

    /// Named queries are not supported.
    pub fn named_query(&mut self, name: &str) -> SessionResult<Vec<RowMap>> {
        Err(SessionError::unsupported_named_query(name))
    }

    // ==================== Execute ====================

    /// Run a statement for its update counters.
    pub fn execute(&mut self, cypher: &str) -> SessionResult<QueryStatistics> {
        self.execute_with(cypher, Properties::new())
    }

    /// Run a parameterized statement for its update counters.
    pub fn execute_with(&mut self, cypher: &str, parameters: Properties) -> SessionResult<QueryStatistics> {
        check_not_empty(cypher).map_err(SessionError::usage)?;
        check_nothing_returned(cypher).map_err(SessionError::usage)?;
        self.run(Statement::new(cypher, parameters).with_stats())
    }

    // ==================== Save ====================

    /// Save an object at the configured depth.
    pub fn save(&mut self, entity: &EntityRef) -> SessionResult<()> {
        let depth = self.config.save_depth;
        self.save_with_depth(entity, depth)
    }

    /// Save each object in turn.
    pub fn save_all(&mut self, entities: &[EntityRef], depth: i32) -> SessionResult<()> {
        for entity in entities {
            self.save_with_depth(entity, depth)?;
        }
        Ok(())
    }

    /// Save an object and what it reaches within `depth` hops.
    ///
    /// New objects receive their identity; the mapping context is refreshed
    /// for everything written.
    pub fn save_with_depth(&mut self, entity: &EntityRef, depth: i32) -> SessionResult<()> {
        let batch = GraphMapper::new(self.metadata, &self.context).map(entity, depth)?;
        if batch.is_empty() {
            debug!("nothing to save");
            return Ok(());
        }

        let url = self.transactions.target_url();
        let statements = batch.statements();
        let results: Vec<StatementResult> = self.handler().batch(&url, &statements)?.collect();

        let mut ids: HashMap<String, i64> = HashMap::new();
        for (compiled, result) in batch.compiled().iter().zip(&results) {
            for binding in &compiled.bindings {
                if let Some(id) = result.first_row_value(binding.alias()).and_then(Value::as_int) {
                    ids.insert(binding.alias().to_string(), id);
                }
            }
        }

        let record = batch.apply(&ids, &mut self.context, self.metadata)?;
        self.transactions.record(record);
        Ok(())
    }

    // ==================== Delete ====================

    /// Delete an object. Objects without identity are left alone.
    pub fn delete(&mut self, entity: &EntityRef) -> SessionResult<()> {
        let metadata = self.metadata;
        let descriptor = match metadata.descriptor_for(&*entity.borrow()) {
            Some(descriptor) => descriptor,
            None => {
                info!(type_name = entity.borrow().type_name(), "not a mapped type, nothing deleted");
                return Ok(());
            }
        };
        let id = match entity.borrow().id() {
            Some(id) => id,
            None => return Ok(()),
        };

        let statement = self.strategy(descriptor).deletes().delete(id);
        self.run(statement)?;
        self.context.remove_entity(descriptor, &*entity.borrow());
        Ok(())
    }

    /// Delete each object in turn.
    pub fn delete_all_of(&mut self, entities: &[EntityRef]) -> SessionResult<()> {
        for entity in entities {
            self.delete(entity)?;
        }
        Ok(())
    }

    /// Delete every object of a type.
    pub fn delete_all(&mut self, type_name: &str) -> SessionResult<()> {
        let descriptor = match self.descriptor(type_name) {
            Some(descriptor) => descriptor,
            None => return Ok(()),
        };
        let statement = self
            .strategy(descriptor)
            .deletes()
            .delete_by_type(descriptor.entity_type());
        self.run(statement)?;
        let dropped = self.context.remove_type(descriptor);
        debug!(type_name, dropped, "deleted all of type");
        Ok(())
    }

    /// Delete every node and relationship in the database.
    pub fn purge_database(&mut self) -> SessionResult<()> {
        self.run(NodeStatements.purge())?;
        self.context.clear();
        Ok(())
    }

    /// Forget everything tracked locally. Makes no request.
    pub fn clear(&mut self) {
        self.context.clear();
    }

    // ==================== Aggregates ====================

    /// Count objects of a type. Unmapped types count 0.
    pub fn count_entities_of_type(&mut self, type_name: &str) -> SessionResult<u64> {
        let descriptor = match self.metadata.descriptor(type_name) {
            Some(descriptor) => descriptor,
            None => return Ok(0),
        };
        let statement = match descriptor.rel_type() {
            Some(rel_type) => AggregateStatements.count_relationships(rel_type),
            None => AggregateStatements.count_nodes(descriptor.labels()),
        };

        let url = self.transactions.target_url();
        let mut response = self.handler().rows(&url, &statement)?;
        let count = response
            .next()
            .and_then(|row| row.values.first().and_then(Value::as_int))
            .unwrap_or(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    // ==================== Transactions ====================

    /// Open an explicit transaction. Operations through the returned scope
    /// join it until it is committed, rolled back or dropped.
    pub fn begin_transaction(&mut self) -> SessionResult<TransactionScope<'_, 'm, T>> {
        self.transactions.open(&mut self.transport)?;
        Ok(TransactionScope::new(self))
    }

    /// The most recent explicit transaction.
    pub fn transaction(&self) -> Option<&Transaction> {
        self.transactions.current()
    }

    /// Check if an explicit transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.transactions.is_open()
    }

    pub fn commit_transaction(&mut self) -> SessionResult<()> {
        self.transactions
            .commit(&mut self.transport, &mut self.context, self.metadata)?;
        Ok(())
    }

    pub fn rollback_transaction(&mut self) -> SessionResult<()> {
        self.transactions
            .rollback(&mut self.transport, &mut self.context, self.metadata)?;
        Ok(())
    }

    pub fn close_transaction(&mut self) -> SessionResult<()> {
        self.transactions
            .close(&mut self.transport, &mut self.context, self.metadata)?;
        Ok(())
    }

    /// Run `callback` against the request layer directly.
    ///
    /// The callback receives a request handler, the URL this session posts
    /// to (the open transaction, or the autocommit endpoint) and the
    /// metadata, so custom statements join any explicit transaction.
    pub fn do_in_transaction<R>(
        &mut self,
        callback: impl FnOnce(&mut RequestHandler<'_, T>, &str, &'m MetaData) -> SessionResult<R>,
    ) -> SessionResult<R> {
        let url = self.transactions.target_url();
        let metadata = self.metadata;
        debug!(url = %url, "running callback");
        callback(&mut self.handler(), &url, metadata)
    }

    // ==================== Helpers ====================

    fn descriptor(&self, type_name: &str) -> Option<&'m EntityDescriptor> {
        let found = self.metadata.descriptor(type_name);
        if found.is_none() {
            info!(type_name, "not a mapped type");
        }
        found
    }

    /// Strategy of a type, resolved once and cached.
    fn strategy(&mut self, descriptor: &EntityDescriptor) -> StatementStrategy {
        *self
            .strategies
            .entry(descriptor.name.clone())
            .or_insert_with(|| StatementStrategy::for_descriptor(descriptor))
    }

    fn handler(&mut self) -> RequestHandler<'_, T> {
        RequestHandler::new(&mut self.transport)
    }

    fn fetch_graph(&mut self, statement: &Statement) -> SessionResult<ReadResult> {
        let url = self.transactions.target_url();
        let graphs: Vec<GraphModel> = self.handler().graph(&url, statement)?.collect();
        Ok(self.read_graphs(graphs))
    }

    fn read_graphs(&mut self, graphs: impl IntoIterator<Item = GraphModel>) -> ReadResult {
        let mut merged = GraphModel::new();
        for graph in graphs {
            merged.merge(graph);
        }
        GraphReader::new(self.metadata, &mut self.context).read(&merged)
    }

    fn map_rows<M: RowMapper>(&mut self, statement: Statement, mapper: &M) -> SessionResult<Vec<M::Output>> {
        let url = self.transactions.target_url();
        let mut response = self.handler().rows(&url, &statement)?;
        let columns = response.columns().to_vec();
        let mut mapped = Vec::new();
        for row in &mut response {
            mapped.push(mapper.map_row(&columns, &row.values)?);
        }
        Ok(mapped)
    }

    fn run(&mut self, statement: Statement) -> SessionResult<QueryStatistics> {
        let url = self.transactions.target_url();
        let mut response = self.handler().statistics(&url, &statement)?;
        Ok(response.next().unwrap_or_default())
    }

    #[cfg(test)]
    fn cached_strategies(&self) -> usize {
        self.strategies.len()
    }
}

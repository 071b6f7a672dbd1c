//! DynamoDB backend
//!
//! Maps the [`Backend`] contract onto DynamoDB calls. Items are converted
//! between JSON and `AttributeValue` on the way in and out.

use crate::backend::{primary_key_of, Backend, Condition, WriteOp};
use crate::config::TableConfig;
use crate::error::StoreError;
use crate::record::Record;
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, ReturnValue, TransactWriteItem};
use aws_sdk_dynamodb::Client;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

type Item = HashMap<String, AttributeValue>;

/// Backend talking to DynamoDB
#[derive(Debug, Clone)]
pub struct DynamoBackend {
    client: Arc<Client>,
}

impl DynamoBackend {
    /// Wrap an existing client
    #[inline]
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Build a client from the default AWS configuration chain
    pub async fn from_env() -> Self {
        info!("Initializing DynamoDB client");
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }

    fn key_item(table: &TableConfig, key: &str) -> Item {
        let mut item = HashMap::new();
        item.insert(table.primary_key.clone(), AttributeValue::S(key.to_string()));
        item
    }

    fn condition_expression(condition: Condition) -> Option<&'static str> {
        match condition {
            Condition::None => None,
            Condition::MustExist => Some("attribute_exists(#pk)"),
            Condition::MustNotExist => Some("attribute_not_exists(#pk)"),
        }
    }

    fn condition_failed(table: &TableConfig, key: &str) -> StoreError {
        StoreError::ConditionFailed {
            table: table.table_name.clone(),
            key: key.to_string(),
        }
    }

    fn to_transact_item(op: WriteOp) -> Result<TransactWriteItem, StoreError> {
        match op {
            WriteOp::Put {
                table,
                item,
                condition,
            } => {
                let mut put = Put::builder()
                    .table_name(&table.table_name)
                    .set_item(Some(record_to_item(item)?));
                if let Some(expr) = Self::condition_expression(condition) {
                    put = put
                        .condition_expression(expr)
                        .expression_attribute_names("#pk", &table.primary_key);
                }
                let put = put.build().map_err(StoreError::backend)?;
                Ok(TransactWriteItem::builder().put(put).build())
            }
            WriteOp::Delete {
                table,
                key,
                condition,
            } => {
                let mut delete = Delete::builder()
                    .table_name(&table.table_name)
                    .set_key(Some(Self::key_item(&table, &key)));
                if let Some(expr) = Self::condition_expression(condition) {
                    delete = delete
                        .condition_expression(expr)
                        .expression_attribute_names("#pk", &table.primary_key);
                }
                let delete = delete.build().map_err(StoreError::backend)?;
                Ok(TransactWriteItem::builder().delete(delete).build())
            }
        }
    }
}

#[async_trait]
impl Backend for DynamoBackend {
    async fn get_item(&self, table: &TableConfig, key: &str) -> Result<Option<Record>, StoreError> {
        debug!("DynamoDB get {} / {}", table.table_name, key);

        let output = self
            .client
            .get_item()
            .table_name(&table.table_name)
            .set_key(Some(Self::key_item(table, key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| StoreError::backend(DisplayErrorContext(e)))?;

        output.item.map(item_to_record).transpose()
    }

    async fn put_item(
        &self,
        table: &TableConfig,
        item: Record,
        condition: Condition,
    ) -> Result<(), StoreError> {
        let key = primary_key_of(table, &item)?.to_string();

        let mut request = self
            .client
            .put_item()
            .table_name(&table.table_name)
            .set_item(Some(record_to_item(item)?));
        if let Some(expr) = Self::condition_expression(condition) {
            request = request
                .condition_expression(expr)
                .expression_attribute_names("#pk", &table.primary_key);
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let service = e.into_service_error();
                if service.is_conditional_check_failed_exception() {
                    Err(Self::condition_failed(table, &key))
                } else {
                    Err(StoreError::backend(DisplayErrorContext(service)))
                }
            }
        }
    }

    async fn delete_item(
        &self,
        table: &TableConfig,
        key: &str,
        condition: Condition,
    ) -> Result<bool, StoreError> {
        let mut request = self
            .client
            .delete_item()
            .table_name(&table.table_name)
            .set_key(Some(Self::key_item(table, key)))
            .return_values(ReturnValue::AllOld);
        if let Some(expr) = Self::condition_expression(condition) {
            request = request
                .condition_expression(expr)
                .expression_attribute_names("#pk", &table.primary_key);
        }

        match request.send().await {
            Ok(output) => Ok(output.attributes.is_some_and(|a| !a.is_empty())),
            Err(e) => {
                let service = e.into_service_error();
                if service.is_conditional_check_failed_exception() {
                    Err(Self::condition_failed(table, key))
                } else {
                    Err(StoreError::backend(DisplayErrorContext(service)))
                }
            }
        }
    }

    async fn scan(&self, table: &TableConfig) -> Result<Vec<Record>, StoreError> {
        let mut records = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&table.table_name)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StoreError::backend(DisplayErrorContext(e)))?;

            for item in output.items.unwrap_or_default() {
                records.push(item_to_record(item)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!("DynamoDB scan {} returned {} items", table.table_name, records.len());
        Ok(records)
    }

    async fn query_index(
        &self,
        table: &TableConfig,
        attribute: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, StoreError> {
        let wanted = limit.unwrap_or(usize::MAX);
        let attr_value = json_to_attribute(value.clone())?;
        let mut records = Vec::new();
        let mut start_key: Option<Item> = None;

        // Without a declared index the attribute is matched with a filtered scan.
        while records.len() < wanted {
            let (items, last_key) = if let Some(index) = table.index_for(attribute) {
                let output = self
                    .client
                    .query()
                    .table_name(&table.table_name)
                    .index_name(index)
                    .key_condition_expression("#attr = :value")
                    .expression_attribute_names("#attr", attribute)
                    .expression_attribute_values(":value", attr_value.clone())
                    .set_exclusive_start_key(start_key.take())
                    .send()
                    .await
                    .map_err(|e| StoreError::backend(DisplayErrorContext(e)))?;
                (output.items, output.last_evaluated_key)
            } else {
                let output = self
                    .client
                    .scan()
                    .table_name(&table.table_name)
                    .filter_expression("#attr = :value")
                    .expression_attribute_names("#attr", attribute)
                    .expression_attribute_values(":value", attr_value.clone())
                    .set_exclusive_start_key(start_key.take())
                    .send()
                    .await
                    .map_err(|e| StoreError::backend(DisplayErrorContext(e)))?;
                (output.items, output.last_evaluated_key)
            };

            for item in items.unwrap_or_default() {
                if records.len() == wanted {
                    break;
                }
                records.push(item_to_record(item)?);
            }

            match last_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(records)
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let count = ops.len();
        let items = ops
            .into_iter()
            .map(Self::to_transact_item)
            .collect::<Result<Vec<_>, _>>()?;

        match self
            .client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
        {
            Ok(_) => {
                debug!("DynamoDB transaction committed {} ops", count);
                Ok(())
            }
            Err(e) => {
                let service = e.into_service_error();
                if service.is_transaction_canceled_exception() {
                    Err(StoreError::TransactionCanceled(
                        DisplayErrorContext(service).to_string(),
                    ))
                } else {
                    Err(StoreError::backend(DisplayErrorContext(service)))
                }
            }
        }
    }
}

/// Convert a JSON record into a DynamoDB item
///
/// # Errors
/// Returns `StoreError::InvalidRecord` for values DynamoDB cannot hold
pub fn record_to_item(record: Record) -> Result<Item, StoreError> {
    record
        .into_iter()
        .map(|(k, v)| json_to_attribute(v).map(|a| (k, a)))
        .collect()
}

/// Convert a DynamoDB item into a JSON record
///
/// # Errors
/// Returns `StoreError::InvalidRecord` for numbers that do not parse
pub fn item_to_record(item: Item) -> Result<Record, StoreError> {
    item.into_iter()
        .map(|(k, v)| attribute_to_json(v).map(|j| (k, j)))
        .collect()
}

fn json_to_attribute(value: Value) -> Result<AttributeValue, StoreError> {
    Ok(match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(items) => AttributeValue::L(
            items
                .into_iter()
                .map(json_to_attribute)
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => AttributeValue::M(record_to_item(map)?),
    })
}

fn attribute_to_json(value: AttributeValue) -> Result<Value, StoreError> {
    Ok(match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::N(n) => Value::Number(parse_number(&n)?),
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::L(items) => Value::Array(
            items
                .into_iter()
                .map(attribute_to_json)
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => Value::Object(item_to_record(map)?),
        AttributeValue::Ss(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        AttributeValue::Ns(items) => Value::Array(
            items
                .iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        other => {
            return Err(StoreError::InvalidRecord(format!(
                "unsupported attribute type: {other:?}"
            )))
        }
    })
}

fn parse_number(raw: &str) -> Result<Number, StoreError> {
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = raw.parse::<u64>() {
        return Ok(Number::from(u));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| StoreError::InvalidRecord(format!("invalid number: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_item_roundtrip() {
        let record: Record = serde_json::from_value(json!({
            "assistantId": "as1",
            "softDelete": false,
            "ttl": 1_700_000_000,
            "score": 0.5,
            "knowledgeBaseFileIds": ["k1", "k2"],
            "modified": {"at": "2026-01-01T00:00:00.000Z", "by": {"userId": "u1"}},
            "description": null
        }))
        .unwrap();

        let item = record_to_item(record.clone()).unwrap();
        assert_eq!(item["ttl"], AttributeValue::N("1700000000".into()));
        assert_eq!(item["description"], AttributeValue::Null(true));

        let back = item_to_record(item).unwrap();
        assert_eq!(Value::Object(back), Value::Object(record));
    }

    #[test]
    fn string_sets_become_arrays() {
        let value = attribute_to_json(AttributeValue::Ss(vec!["a".into(), "b".into()])).unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }

    #[test]
    fn bad_number_rejected() {
        assert!(parse_number("not-a-number").is_err());
        assert_eq!(parse_number("-3").unwrap(), Number::from(-3));
    }

    #[test]
    fn condition_expressions() {
        assert_eq!(DynamoBackend::condition_expression(Condition::None), None);
        assert_eq!(
            DynamoBackend::condition_expression(Condition::MustExist),
            Some("attribute_exists(#pk)")
        );
    }
}

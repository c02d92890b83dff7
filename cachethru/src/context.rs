//! Per-call resolved metadata
//!
//! A `CallContext` is built once at the start of each decorated call and
//! dropped when the call returns. It carries everything the pipeline
//! needs: the effective policy, the expiration window, the payload shape,
//! and the canonicalized arguments the cache key is derived from. Nothing
//! in it is shared between calls.

use serde::Serialize;
use serde_json::Value;

use crate::error::ConfigError;
use crate::method::{MethodTable, PayloadShape};
use crate::policy::CachePolicy;

/// Immutable metadata for one decorated call
#[derive(Debug, Clone)]
pub struct CallContext {
    method: String,
    args: Value,
    policy: CachePolicy,
    expiration_millis: i64,
    payload: PayloadShape,
}

impl CallContext {
    /// Resolve the metadata for one call against the registration table.
    ///
    /// Policy precedence: a specified override policy wins outright;
    /// otherwise the method's declared policy applies, with a missing
    /// entry or a declared `Unspecified` resolving to `IgnoreCache`. The
    /// expiration window is read from the entry regardless of which
    /// policy won, so per-method windows stay in effect under a global
    /// override.
    ///
    /// # Arguments
    /// * `method` - Call identity, also the first half of the cache key
    /// * `args` - Call arguments; serialized into a canonical JSON value
    /// * `table` - The composition-time method registrations
    /// * `override_policy` - Global policy; ignored when `Unspecified`
    ///
    /// # Returns
    /// The resolved context, or a `ConfigError` when the call site's
    /// payload type contradicts the registered one or the arguments
    /// cannot be serialized.
    pub fn resolve<T, A>(
        method: &str,
        args: &A,
        table: &MethodTable,
        override_policy: CachePolicy,
    ) -> Result<Self, ConfigError>
    where
        T: 'static,
        A: Serialize + ?Sized,
    {
        let requested = PayloadShape::of::<T>();
        let entry = table.get(method);

        if let Some(registered) = entry.and_then(|e| e.payload())
            && registered != requested
        {
            return Err(ConfigError::payload_mismatch(
                method,
                registered.type_name(),
                requested.type_name(),
            ));
        }

        let declared = entry.map(|e| e.config().policy()).unwrap_or_default();
        let policy = if override_policy.is_specified() {
            override_policy
        } else {
            declared.normalize()
        };

        let expiration_millis = entry.map(|e| e.config().expiration_millis()).unwrap_or(0);

        Ok(Self {
            method: method.to_string(),
            args: canonicalize(method, args)?,
            policy,
            expiration_millis,
            payload: requested,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &Value {
        &self.args
    }

    /// The effective policy; never `Unspecified`
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    pub fn expiration_millis(&self) -> i64 {
        self.expiration_millis
    }

    pub fn payload(&self) -> PayloadShape {
        self.payload
    }

    pub fn can_read_fresh(&self) -> bool {
        self.policy.can_read_fresh()
    }

    pub fn can_read_stale(&self) -> bool {
        self.policy.can_read_stale()
    }

    pub fn can_store(&self) -> bool {
        self.policy.can_store()
    }

    /// Freshness predicate for a stored entry.
    ///
    /// An entry is expired once its age reaches the expiration window.
    /// The window is never negative, so an entry stamped in the future
    /// has negative age and reads as fresh whatever the window is.
    pub fn is_expired(&self, created_at_millis: i64, now_millis: i64) -> bool {
        now_millis - created_at_millis >= self.expiration_millis
    }
}

/// Serialize arguments into the canonical form keys are derived from.
///
/// The unit argument serializes to `Null`; it normalizes to the empty
/// array so "no arguments" has exactly one canonical spelling.
fn canonicalize<A>(method: &str, args: &A) -> Result<Value, ConfigError>
where
    A: Serialize + ?Sized,
{
    let value = serde_json::to_value(args)
        .map_err(|source| ConfigError::invalid_arguments(method, source))?;

    Ok(match value {
        Value::Null => Value::Array(Vec::new()),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{MethodConfig, MethodEntry};
    use std::time::Duration;

    fn table_with(method: &str, entry: MethodEntry) -> MethodTable {
        let mut table = MethodTable::new();
        table.insert(method, entry);
        table
    }

    #[test]
    fn test_declared_policy_applies_without_override() {
        let table = table_with(
            "get_user",
            MethodEntry::new(MethodConfig::new(CachePolicy::PreferCache)),
        );

        let context = CallContext::resolve::<String, _>(
            "get_user",
            &(42,),
            &table,
            CachePolicy::Unspecified,
        )
        .unwrap();

        assert_eq!(context.policy(), CachePolicy::PreferCache);
    }

    #[test]
    fn test_specified_override_wins_over_declared() {
        let table = table_with(
            "get_user",
            MethodEntry::new(MethodConfig::new(CachePolicy::IgnoreCache)),
        );

        let context =
            CallContext::resolve::<String, _>("get_user", &(42,), &table, CachePolicy::PreferCache)
                .unwrap();

        assert_eq!(context.policy(), CachePolicy::PreferCache);
    }

    #[test]
    fn test_missing_entry_resolves_to_ignore_cache() {
        let table = MethodTable::new();

        let context = CallContext::resolve::<String, _>(
            "unregistered",
            &(42,),
            &table,
            CachePolicy::Unspecified,
        )
        .unwrap();

        assert_eq!(context.policy(), CachePolicy::IgnoreCache);
        assert_eq!(context.expiration_millis(), 0);
    }

    #[test]
    fn test_declared_unspecified_resolves_to_ignore_cache() {
        let table = table_with(
            "get_user",
            MethodEntry::new(MethodConfig::new(CachePolicy::Unspecified)),
        );

        let context = CallContext::resolve::<String, _>(
            "get_user",
            &(42,),
            &table,
            CachePolicy::Unspecified,
        )
        .unwrap();

        assert_eq!(context.policy(), CachePolicy::IgnoreCache);
    }

    #[test]
    fn test_expiration_read_even_when_policy_comes_from_override() {
        let table = table_with(
            "get_user",
            MethodEntry::new(MethodConfig::default().expires_after(Duration::from_secs(60))),
        );

        let context =
            CallContext::resolve::<String, _>("get_user", &(42,), &table, CachePolicy::PreferCache)
                .unwrap();

        assert_eq!(context.policy(), CachePolicy::PreferCache);
        assert_eq!(context.expiration_millis(), 60_000);
    }

    #[test]
    fn test_payload_mismatch_is_fatal() {
        let table = table_with(
            "get_user",
            MethodEntry::with_payload::<String>(MethodConfig::new(CachePolicy::PreferCache)),
        );

        let result =
            CallContext::resolve::<u32, _>("get_user", &(42,), &table, CachePolicy::Unspecified);

        assert!(matches!(
            result,
            Err(ConfigError::PayloadMismatch { .. })
        ));
    }

    #[test]
    fn test_matching_payload_pin_passes() {
        let table = table_with(
            "get_user",
            MethodEntry::with_payload::<String>(MethodConfig::new(CachePolicy::PreferCache)),
        );

        let result =
            CallContext::resolve::<String, _>("get_user", &(42,), &table, CachePolicy::Unspecified);

        assert!(result.is_ok());
    }

    #[test]
    fn test_unit_args_canonicalize_to_empty_array() {
        let table = MethodTable::new();

        let context =
            CallContext::resolve::<String, _>("ping", &(), &table, CachePolicy::Unspecified)
                .unwrap();

        assert_eq!(*context.args(), Value::Array(Vec::new()));
    }

    #[test]
    fn test_tuple_args_keep_order() {
        let table = MethodTable::new();

        let context =
            CallContext::resolve::<String, _>("get", &(1, 2), &table, CachePolicy::Unspecified)
                .unwrap();

        assert_eq!(context.args().to_string(), "[1,2]");
    }

    fn context_with_expiration(expiration: Duration) -> CallContext {
        let table = table_with(
            "get_user",
            MethodEntry::new(
                MethodConfig::new(CachePolicy::PreferCache).expires_after(expiration),
            ),
        );
        CallContext::resolve::<String, _>("get_user", &(), &table, CachePolicy::Unspecified)
            .unwrap()
    }

    #[test]
    fn test_entry_at_exact_window_age_is_expired() {
        let context = context_with_expiration(Duration::from_millis(60_000));
        let now = 1_000_000;

        assert!(context.is_expired(now - 60_000, now));
    }

    #[test]
    fn test_entry_just_inside_window_is_fresh() {
        let context = context_with_expiration(Duration::from_millis(60_000));
        let now = 1_000_000;

        assert!(!context.is_expired(now - 59_999, now));
    }

    #[test]
    fn test_future_created_entry_is_fresh() {
        let context = context_with_expiration(Duration::from_millis(1));
        let now = 1_000_000;

        assert!(!context.is_expired(now + 60_000, now));
    }

    #[test]
    fn test_zero_window_expires_immediately() {
        let context = context_with_expiration(Duration::ZERO);
        let now = 1_000_000;

        assert!(context.is_expired(now, now));
        assert!(context.is_expired(now - 1, now));
        assert!(!context.is_expired(now + 1, now));
    }
}

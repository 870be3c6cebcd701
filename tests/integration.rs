//! Integration tests for configuration binding and per-request classification.

use k2bot::{
    BuildError, ConfigBinder, ConfigError, Error, FnResolver, KeySource, LookupTable,
    MemoryLoader, Outcome, RequestLookup, RequestPool, RequestVariables, ScopeConf,
    TableLoader,
};
use std::cell::Cell;
use std::sync::Arc;

fn bots_loader() -> MemoryLoader {
    let mut loader = MemoryLoader::new();
    loader
        .add(
            "bots",
            [
                ("static-key", "crawler"),
                ("prefix-Googlebot-suffix", "search-engine"),
                ("Googlebot", "search-engine"),
                ("bingbot", "search-engine"),
                ("AhrefsBot", "seo"),
            ],
        )
        .add("empty", Vec::<(&str, &str)>::new());
    loader
}

#[test]
fn test_static_key_scenario() {
    let loader = bots_loader();
    let mut conf = ScopeConf::new();
    conf.set_key("static-key").unwrap();
    conf.set_table("bots", &loader).unwrap();

    let calls = Cell::new(0);
    let resolver = FnResolver::new(|_: &str| {
        calls.set(calls.get() + 1);
        None
    });
    let pool = RequestPool::unbounded();
    let lookup = RequestLookup::new(&conf);

    let first = lookup.outcome(&resolver, &pool).unwrap();
    assert_eq!(first.value(), Some((&b"crawler"[..], 7)));

    let second = lookup.outcome(&resolver, &pool).unwrap();
    assert_eq!(second, first);

    // No evaluation for literal keys
    assert_eq!(calls.get(), 0);
    assert_eq!(pool.allocations(), 0);
    assert_eq!(lookup.evaluations(), 1);
}

#[test]
fn test_templated_key_scenario() {
    let loader = bots_loader();
    let mut conf = ScopeConf::new();
    conf.set_key("prefix-$ua-suffix").unwrap();
    conf.set_table("bots", &loader).unwrap();

    let mut vars = RequestVariables::new();
    vars.set("ua", "Googlebot");
    let pool = RequestPool::unbounded();
    let lookup = RequestLookup::new(&conf);

    let outcome = lookup.outcome(&vars, &pool).unwrap();
    assert_eq!(lookup.key(), Some(&b"prefix-Googlebot-suffix"[..]));
    assert_eq!(outcome, Outcome::Found(b"search-engine"));
}

#[test]
fn test_empty_variable_scenario() {
    let loader = bots_loader();
    let mut conf = ScopeConf::new();
    conf.set_key("$ua").unwrap();
    conf.set_table("bots", &loader).unwrap();

    let mut vars = RequestVariables::new();
    vars.set("ua", "");
    let pool = RequestPool::unbounded();

    let lookup = RequestLookup::new(&conf);
    assert_eq!(lookup.outcome(&vars, &pool).unwrap(), Outcome::NotFound);

    let value = lookup.variable(&vars, &pool).unwrap();
    assert!(value.is_not_found());
}

#[test]
fn test_duplicate_directive_scenario() {
    let loader = bots_loader();
    let mut binder = ConfigBinder::new(&loader);
    let yaml = r#"
lookup_table: bots
directives:
  - [lookup_key, "$http_user_agent"]
  - [lookup_key, "$remote_addr"]
"#;

    match binder.bind_str(yaml) {
        Err(Error::Config(ConfigError::DuplicateDirective { directive })) => {
            assert_eq!(directive, "lookup_key");
        }
        other => panic!("expected duplicate directive error, got {:?}", other.err()),
    }
}

#[test]
fn test_empty_table_is_never_found_or_not_found() {
    let loader = bots_loader();
    let vars: RequestVariables = [("ua", "Googlebot")].into_iter().collect();
    let pool = RequestPool::unbounded();

    for pattern in ["Googlebot", "$ua", "x-$ua", "$missing"] {
        let mut conf = ScopeConf::new();
        conf.set_key(pattern).unwrap();
        conf.set_table("empty", &loader).unwrap();

        let lookup = RequestLookup::new(&conf);
        assert_eq!(
            lookup.outcome(&vars, &pool).unwrap(),
            Outcome::NotApplicable,
            "pattern {}",
            pattern
        );
    }
}

#[test]
fn test_scope_inheritance_end_to_end() {
    let loader = bots_loader();
    let mut binder = ConfigBinder::new(&loader);
    let tree = binder
        .bind_str(
            r#"
lookup_key: "$http_user_agent"
lookup_table: bots
scopes:
  static:
    lookup_key: "static-key"
  inert:
    lookup_table: empty
  api:
    scopes:
      internal: {}
"#,
        )
        .unwrap();

    let mut vars = RequestVariables::new();
    vars.set("HTTP_USER_AGENT", "AhrefsBot");

    let classify = |path: &str| {
        let conf = tree.get(path).unwrap();
        let pool = RequestPool::unbounded();
        RequestLookup::new(conf)
            .variable(&vars, &pool)
            .unwrap()
            .to_string()
    };

    assert_eq!(classify(""), "seo");
    assert_eq!(classify("static"), "crawler");
    assert_eq!(classify("inert"), "");
    assert_eq!(classify("api/internal"), "seo");

    // Inheritance shares the parent's handles
    let root = tree.get("").unwrap();
    let internal = tree.get("api/internal").unwrap();
    assert!(Arc::ptr_eq(root.table().unwrap(), internal.table().unwrap()));
    match (root.key(), internal.key()) {
        (Some(KeySource::Template(a)), Some(KeySource::Template(b))) => {
            assert!(Arc::ptr_eq(a, b))
        }
        _ => panic!("expected inherited template"),
    }
}

#[test]
fn test_table_shared_across_threads() {
    let table = Arc::new(LookupTable::from_entries([
        ("Googlebot", "search-engine"),
        ("bingbot", "search-engine"),
    ]));

    let mut conf = ScopeConf::new();
    conf.set_key("$ua").unwrap();
    conf.set_table_handle("shared", Arc::clone(&table)).unwrap();
    let conf = Arc::new(conf);

    let handles: Vec<_> = ["Googlebot", "bingbot", "curl"]
        .into_iter()
        .map(|ua| {
            let conf = Arc::clone(&conf);
            std::thread::spawn(move || {
                let vars: RequestVariables = [("ua", ua)].into_iter().collect();
                let pool = RequestPool::unbounded();
                let lookup = RequestLookup::new(&conf);
                lookup.outcome(&vars, &pool).unwrap().is_found()
            })
        })
        .collect();

    let found: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(found, [true, true, false]);
}

#[test]
fn test_pool_exhaustion_surfaces_as_error() {
    let loader = bots_loader();
    let mut conf = ScopeConf::new();
    conf.set_key("prefix-$ua-suffix").unwrap();
    conf.set_table("bots", &loader).unwrap();

    let vars: RequestVariables = [("ua", "Googlebot")].into_iter().collect();
    let pool = RequestPool::with_budget(10);
    let lookup = RequestLookup::new(&conf);

    let err = lookup.outcome(&vars, &pool).unwrap_err();
    let err: Error = err.into();
    assert!(err.to_string().contains("cannot allocate"));
}

#[test]
fn test_failing_loader_aborts_binding() {
    let loader = |path: &str| -> Result<LookupTable, BuildError> {
        Err(BuildError::Malformed {
            source_name: path.to_string(),
            reason: "unexpected end of data".to_string(),
        })
    };
    assert!(loader.load("x").is_err());

    let mut binder = ConfigBinder::new(&loader);
    let err = binder.bind_str("lookup_table: bots.db").unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::Build(BuildError::Malformed { .. }))
    ));
}

//! Bootstrap integration tests

use spacey_pack_runtime::addon::{AddonBootstrap, DynamicLoader};
use spacey_pack_runtime::bootstrap::{BrowserBootstrap, HostBindings, HostBootstrap};
use spacey_pack_runtime::config::{BrowserConfig, HostConfig};
use spacey_pack_runtime::globals::ShimSet;
use spacey_pack_runtime::{
    ModuleId, ModuleTable, NativeFunction, NativeHandle, Object, RuntimeError, Value,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::tempdir;

/// Stands in for the platform loader; remembers each path it was given and
/// whether the file was present at that moment
#[derive(Clone, Default)]
struct FakeLoader {
    seen: Rc<RefCell<Vec<(PathBuf, bool)>>>,
    reject: bool,
}

impl DynamicLoader for FakeLoader {
    fn load(&self, path: &Path, name: &str) -> Result<Value, RuntimeError> {
        self.seen
            .borrow_mut()
            .push((path.to_path_buf(), path.is_file()));
        if self.reject {
            return Err(RuntimeError::AddonLoad {
                path: path.to_path_buf(),
                reason: "not a shared object".to_string(),
            });
        }
        Ok(NativeHandle::new(name, path.to_path_buf()).into())
    }
}

fn addon_table(payload: &'static str) -> ModuleTable {
    let mut table = ModuleTable::new();
    table.push("/app/index.js", |scope| {
        let native = scope.require(ModuleId(1))?;
        scope.exports().set("native", native);
        Ok(())
    });
    table.push("/app/build/Release/fast.node", move |scope| {
        scope.load_addon("fast.node", payload)
    });
    table
}

fn host_config(dir: &Path) -> HostConfig {
    HostConfig {
        temp_dir: dir.to_path_buf(),
        native_addons: false,
        interpreter: None,
    }
}

#[test]
fn test_host_addon_replaces_exports_and_cleans_up() {
    let dir = tempdir().unwrap();
    let loader = FakeLoader::default();
    let addons = AddonBootstrap::new(dir.path(), loader.clone());

    let runtime = HostBootstrap::new(host_config(dir.path()))
        .with_addons(addons)
        .run(addon_table("f0VMRgIBAQ==\n"))
        .unwrap();

    let native = runtime.exports().get("native");
    let Value::Native(handle) = &native else {
        panic!("expected a native handle, got {:?}", native);
    };
    assert_eq!(handle.name(), "fast.node");

    let seen = loader.seen.borrow();
    assert_eq!(seen.len(), 1);
    let (path, existed) = &seen[0];
    assert!(existed);
    assert_eq!(handle.downcast_ref::<PathBuf>(), Some(path));
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let record = runtime.loader().cache().get(ModuleId(1)).unwrap();
    assert!(record.is_loaded());
}

#[test]
fn test_host_addon_failure_cleans_up() {
    let dir = tempdir().unwrap();
    let loader = FakeLoader {
        reject: true,
        ..Default::default()
    };
    let addons = AddonBootstrap::new(dir.path(), loader.clone());

    let err = HostBootstrap::new(host_config(dir.path()))
        .with_addons(addons)
        .run(addon_table("AAECAw=="))
        .err()
        .unwrap();
    assert!(matches!(err, RuntimeError::AddonLoad { .. }));
    assert_eq!(loader.seen.borrow().len(), 1);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_addon_names_are_unique() {
    let dir = tempdir().unwrap();
    let loader = FakeLoader::default();
    let addons = AddonBootstrap::new(dir.path(), loader.clone());

    for _ in 0..8 {
        addons.load("same.node", "AA==").unwrap();
    }
    let seen = loader.seen.borrow();
    let mut paths: Vec<&PathBuf> = seen.iter().map(|(p, _)| p).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 8);
}

#[test]
fn test_browser_bundle_runs_timers() {
    let log = Rc::new(RefCell::new(Vec::<String>::new()));
    let sink = Rc::clone(&log);

    let shims = ShimSet::new(vec!["--mode".to_string(), "test".to_string()]);
    let mut table = ModuleTable::new();
    table.push("/srv/bundle.js", move |scope| {
        let context = scope.context();
        let argv = context.get("process").get("argv");
        sink.borrow_mut().push(format!("argv {}", argv.get("2")));

        let sink = Rc::clone(&sink);
        let tick = NativeFunction::new("tick", move |args| {
            sink.borrow_mut().push(format!("tick {}", args[0]));
            Ok(Value::Undefined)
        });
        context
            .get("setTimeout")
            .call(&[tick.clone().into(), Value::Number(5.0), "late".into()])?;
        context
            .get("setImmediate")
            .call(&[tick.into(), "soon".into()])?;
        Ok(())
    });
    let ids = shims.install(&mut table);

    let global = Value::from(Object::new());
    let host = HostBindings {
        self_: global.clone(),
        ..Default::default()
    };
    let runtime = BrowserBootstrap::new(BrowserConfig { shims: ids })
        .run(table, host)
        .unwrap();
    assert_eq!(runtime.context().global_object(), Some(&global));
    assert_eq!(shims.timers().pending(), 2);

    shims.timers().run_until_idle().unwrap();
    assert_eq!(*log.borrow(), vec!["argv test", "tick soon", "tick late"]);
}

#[test]
fn test_browser_shim_failure_stops_bootstrap() {
    let mut table = ModuleTable::new();
    table.push("/srv/bundle.js", |_| Err(RuntimeError::thrown("entry ran")));
    table.push("<shim>/console.js", |_| Err(RuntimeError::thrown("console shim broke")));
    table.push("<shim>/timers.js", |_| Ok(()));
    table.push("<shim>/buffer.js", |_| Ok(()));
    table.push("<shim>/process.js", |_| Ok(()));

    let err = BrowserBootstrap::new(BrowserConfig::default())
        .run(table, HostBindings::default())
        .err()
        .unwrap();
    assert_eq!(err.to_string(), "Uncaught console shim broke");
}

#[test]
fn test_browser_shims_load_in_binding_order() {
    let order = Rc::new(RefCell::new(Vec::<&'static str>::new()));
    let record = |name: &'static str, exports: &'static [&'static str]| {
        let order = Rc::clone(&order);
        move |scope: &spacey_pack_runtime::ModuleScope<'_>| -> Result<(), RuntimeError> {
            order.borrow_mut().push(name);
            for export in exports {
                scope.exports().set(*export, true);
            }
            Ok(())
        }
    };

    // Table slots deliberately reverse the binding order
    let mut table = ModuleTable::new();
    table.push("/srv/bundle.js", record("entry", &[]));
    table.push("<shim>/process.js", record("process", &[]));
    table.push("<shim>/buffer.js", record("buffer", &["Buffer"]));
    table.push(
        "<shim>/timers.js",
        record(
            "timers",
            &[
                "setTimeout",
                "clearTimeout",
                "setInterval",
                "clearInterval",
                "setImmediate",
                "clearImmediate",
            ],
        ),
    );
    table.push("<shim>/console.js", record("console", &[]));

    let shims = spacey_pack_runtime::globals::ShimIds {
        console: ModuleId(4),
        timers: ModuleId(3),
        buffer: ModuleId(2),
        process: ModuleId(1),
    };
    BrowserBootstrap::new(BrowserConfig { shims })
        .run(table, HostBindings::default())
        .unwrap();

    assert_eq!(
        *order.borrow(),
        vec!["console", "timers", "buffer", "process", "entry"]
    );
}

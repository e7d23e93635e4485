#![allow(dead_code)]

pub mod volume {
    //! In-memory volume backing the original operations in tests.

    use anyhow::anyhow;
    use fsrouter::operation::{Invocation, OperationTable};
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    /// Files keyed by absolute path, plus a log of every original call.
    #[derive(Clone, Default)]
    pub struct MemVolume {
        files: Arc<Mutex<BTreeMap<String, String>>>,
        calls: Arc<Mutex<Vec<Invocation>>>,
    }

    impl MemVolume {
        pub fn from_files(files: &[(&str, &str)]) -> Self {
            let volume = Self::default();
            {
                let mut map = volume.files.lock();
                for (path, contents) in files {
                    map.insert((*path).to_string(), (*contents).to_string());
                }
            }
            volume
        }

        /// Original-operation invocations, in call order
        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self, operation: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|inv| inv.operation.as_ref() == operation)
                .count()
        }

        fn record(&self, inv: &Invocation) {
            self.calls.lock().push(inv.clone());
        }

        fn stat(&self, inv: &Invocation) -> anyhow::Result<Value> {
            self.record(inv);
            let files = self.files.lock();
            match files.get(&inv.path) {
                Some(contents) => Ok(json!({ "path": inv.path, "size": contents.len(), "isFile": true })),
                None => Err(anyhow!("ENOENT: no such file or directory, stat '{}'", inv.path)),
            }
        }

        fn read_file(&self, inv: &Invocation) -> anyhow::Result<Value> {
            self.record(inv);
            self.files
                .lock()
                .get(&inv.path)
                .map(|contents| Value::String(contents.clone()))
                .ok_or_else(|| anyhow!("ENOENT: no such file or directory, open '{}'", inv.path))
        }

        fn exists(&self, inv: &Invocation) -> anyhow::Result<Value> {
            self.record(inv);
            Ok(Value::Bool(self.files.lock().contains_key(&inv.path)))
        }

        /// Operation table over this volume. Deferred operations complete
        /// their callback before returning.
        pub fn table(&self) -> OperationTable {
            let stat_sync = self.clone();
            let stat = self.clone();
            let read_sync = self.clone();
            let read = self.clone();
            let exists = self.clone();
            OperationTable::new()
                .blocking("statSync", move |inv| stat_sync.stat(inv))
                .deferred("stat", move |inv, done| done(stat.stat(&inv)))
                .blocking("readFileSync", move |inv| read_sync.read_file(inv))
                .deferred("readFile", move |inv, done| done(read.read_file(&inv)))
                .blocking("existsSync", move |inv| exists.exists(inv))
        }
    }
}

pub mod deferred {
    //! Awaiting deferred calls from tokio tests.

    use fsrouter::Operations;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::oneshot;

    /// Outcome of a deferred call and how many times its callback ran.
    pub struct Delivered {
        pub result: anyhow::Result<Value>,
        pub callbacks: Arc<AtomicUsize>,
    }

    impl Delivered {
        pub fn times_called(&self) -> usize {
            self.callbacks.load(Ordering::SeqCst)
        }
    }

    /// Call `operation` through the deferred facade and wait for its callback.
    pub async fn call(ops: &Operations, operation: &str, path: &str) -> Delivered {
        let callbacks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&callbacks);
        let (tx, rx) = oneshot::channel();
        ops.call(operation, path, vec![], move |result| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(result);
        });
        let result = tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("callback within timeout")
            .expect("callback invoked");
        Delivered { result, callbacks }
    }
}

pub mod trail {
    //! Records which middlewares ran, in order.

    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct Trail(Arc<Mutex<Vec<&'static str>>>);

    impl Trail {
        pub fn hit(&self, name: &'static str) {
            self.0.lock().push(name);
        }

        pub fn entries(&self) -> Vec<&'static str> {
            self.0.lock().clone()
        }
    }
}

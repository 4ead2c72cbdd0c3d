use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use objdag::dag::TargetNode;
use objdag::exec::{CompileFuture, CompileOutcome, Compiler};

/// A fake compiler that:
/// - records the key of every target it is asked to build
/// - reports `Failed(1)` for keys registered with [`FakeCompiler::failing`],
///   `Success` otherwise.
#[derive(Clone, Default)]
pub struct FakeCompiler {
    built: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
}

impl FakeCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_uppercase());
        self
    }

    /// Shared handle on the recorded keys, usable after the compiler has
    /// been moved into a driver.
    pub fn built_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.built)
    }

    pub fn built(&self) -> Vec<String> {
        self.built.lock().unwrap().clone()
    }
}

impl Compiler for FakeCompiler {
    fn compile<'a>(&'a mut self, node: &'a TargetNode) -> CompileFuture<'a> {
        let key = node.key().to_string();
        let built = Arc::clone(&self.built);
        let fails = self.failing.contains(&key);

        Box::pin(async move {
            built.lock().unwrap().push(key);
            Ok(if fails {
                CompileOutcome::Failed(1)
            } else {
                CompileOutcome::Success
            })
        })
    }
}

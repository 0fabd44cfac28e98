use fieldwire::application::Application;
use fieldwire_di::injected::{Injected, InitializationKind};
use std::sync::Arc;

trait Greeter {
    fn greet(&self) -> String;
}

struct EnglishGreeter;

impl Greeter for EnglishGreeter {
    fn greet(&self) -> String {
        "Hello world!".to_string()
    }
}

struct GreetingController {
    greeter: Injected<Arc<dyn Greeter + Send + Sync>>,
}

impl GreetingController {
    fn new() -> Self {
        Self {
            // the process-wide lookup policy gets configured by the Application
            greeter: Injected::new::<Self>(InitializationKind::Lazily, None),
        }
    }

    fn run(&self) {
        println!("{}", self.greeter.get(self).greet());
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    // the application reads configuration from the environment, installs a logger and makes the
    // registry global
    Application::from_environment()
        .bootstrap(|registry| {
            registry.register(None, || {
                Arc::new(EnglishGreeter) as Arc<dyn Greeter + Send + Sync>
            });
        })
        .expect("error bootstrapping application");

    // prints "Hello world!"
    GreetingController::new().run();
}

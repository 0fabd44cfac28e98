// note: this example assumes you've analyzed the previous one

use fieldwire::application::Application;
use fieldwire::config::{WiringConfig, WiringConfigProvider};
use fieldwire_di::lookup_policy::LookupPolicy;
use fieldwire_di::ErrorPtr;

// wiring config is provided by a WiringConfigProvider, which by default uses environment variables
// and a configuration file (see module documentation)
// to provide your own, implement this trait and pass it to the Application
struct MyWiringConfigProvider {
    // this is the cached custom config
    config: WiringConfig,
}

impl MyWiringConfigProvider {
    fn new() -> Self {
        // start with a default config and override what's needed
        let mut config = WiringConfig::default();
        config.install_tracing_logger = false;
        config.warn_on_overwrite = false;

        Self { config }
    }
}

impl WiringConfigProvider for MyWiringConfigProvider {
    fn config(&self) -> Result<WiringConfig, ErrorPtr> {
        Ok(self.config.clone())
    }
}

fn main() {
    let application = Application::new(MyWiringConfigProvider::new(), LookupPolicy::shared());

    let registry = application
        .bootstrap(|registry| {
            registry.register(Some("greeting"), || "Hello".to_string());
            // overwriting is only logged at debug level with this configuration
            registry.register(Some("greeting"), || "Hello again".to_string());
        })
        .expect("error bootstrapping application");

    // prints "Hello again"
    println!(
        "{}",
        registry
            .resolve::<String>(Some("greeting"), None)
            .expect("missing greeting")
    );
}

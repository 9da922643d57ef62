//! Page configuration shared by the components

use panel::PanelConfig;
use std::cell::RefCell;

thread_local! {
    static CONFIG: RefCell<PanelConfig> = RefCell::new(PanelConfig::default());
}

pub fn current() -> PanelConfig {
    CONFIG.with(|c| c.borrow().clone())
}

pub fn replace(config: PanelConfig) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

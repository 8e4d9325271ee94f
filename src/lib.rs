pub mod app;
pub mod config;

pub mod domain {
    pub mod entities {
        pub mod column;
        pub mod dataset;
        pub mod edit;
        pub mod row;
    }
    pub mod rules {
        pub mod validation;
    }
}

pub mod usecase {
    pub mod ports {
        pub mod source;
    }
    pub mod services {
        pub mod dataset_cache;
        pub mod edit_service;
        pub mod export_service;
        pub mod query_service;
        pub mod row_transformer;
        pub mod view_controller;
    }
}

pub mod infra {
    pub mod http {
        pub mod source;
    }
    pub mod export {
        pub mod csv;
    }
}

pub mod platform {
    pub mod desktop {
        pub mod paths;
    }
}

pub mod ui {
    pub mod state {
        pub mod app_state;
    }
}

#[cfg(test)]
mod testing;

pub use config::{TableConfig, DATA_URL, PAGE_SIZE};

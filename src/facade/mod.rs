mod maintenance;

pub use maintenance::MaintenanceDb;

/// Resolves the chart-manager executable.
pub mod locator;

/// Runs external chart-manager processes.
pub mod process;

/// Registers chart repositories.
pub mod repository;

/// Contains tools to run the upgrade-or-install command.
pub mod upgrade;

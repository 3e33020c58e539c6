//! Cyclic module interface
//!
//! A module is set up once from its parameters and then driven by the
//! executable, one call to `proc` per new input. `ArmCtrl` is the main
//! example: it is initialised with the arm and control parameters, and each
//! `proc` turns a command into a trajectory.

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// State of a cyclic module.
pub trait State {
    /// Parameters and other data needed to set the module up.
    type InitData;
    type InitError;

    /// Input to a single processing step.
    type InputData;
    /// Output of a single processing step, e.g. a planned trajectory.
    type OutputData;
    /// Diagnostics on a single processing step, suitable for logging.
    type StatusReport;
    type ProcError;

    /// Set the module up, discarding any state left from a previous
    /// initialisation.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError>;

    /// Run one processing step.
    ///
    /// An error must leave the module usable, so that the executable can
    /// carry on with the next input.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}

use std::{fmt, io::Write};

use crate::{
    callback::Callback,
    extension_error::ExtensionError,
    simple_extension::{Action, ConditionOptions, Invocation, SimpleExtension},
    training_log::{is_private_attribute, LogValue, TrainingLog},
};

const RULE_WIDTH: usize = 79;

/// Prints the training status and the current log row when triggered.
///
/// Attributes whose names start with an underscore are not printed.
pub struct Printing {
    out: Box<dyn Write + Send>,
}

impl fmt::Debug for Printing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Printing").finish_non_exhaustive()
    }
}

impl Printing {
    /// The conditions used by [`Printing::new`]: before the first epoch, after every epoch, and after training
    pub fn default_options() -> ConditionOptions {
        ConditionOptions {
            before_first_epoch: true,
            after_every_epoch: true,
            after_training: true,
            ..Default::default()
        }
    }

    /// Print to stdout under the [default conditions](Printing::default_options)
    pub fn new() -> SimpleExtension<Printing> {
        Printing::with_options(Printing::default_options())
    }

    /// Print to stdout whenever one of the conditions in `options` holds
    pub fn with_options(options: ConditionOptions) -> SimpleExtension<Printing> {
        Printing::to_writer(Box::new(std::io::stdout()), options)
    }

    /// Print to `out` whenever one of the conditions in `options` holds
    pub fn to_writer(out: Box<dyn Write + Send>, options: ConditionOptions) -> SimpleExtension<Printing> {
        SimpleExtension::new(Printing { out }, options)
    }

    fn print_attributes<'a>(
        &mut self,
        attributes: impl IntoIterator<Item = (&'a str, &'a LogValue)>,
    ) -> std::io::Result<()> {
        for (name, value) in attributes {
            if !is_private_attribute(name) {
                writeln!(self.out, "\t {}: {}", name, value)?;
            }
        }
        Ok(())
    }

    fn print_report(&mut self, which_callback: Callback, log: &TrainingLog) -> std::io::Result<()> {
        let rule = "-".repeat(RULE_WIDTH);
        writeln!(self.out, "{}", rule)?;
        match which_callback {
            Callback::BeforeEpoch if log.status.epochs_done == 0 => {
                writeln!(self.out, "BEFORE FIRST EPOCH")?
            }
            Callback::AfterTraining => writeln!(self.out, "TRAINING HAS BEEN FINISHED:")?,
            Callback::AfterEpoch => writeln!(self.out, "AFTER ANOTHER EPOCH")?,
            _ => {}
        }
        writeln!(self.out, "{}", rule)?;

        writeln!(self.out, "Training status:")?;
        let status = log.status.attributes();
        self.print_attributes(status.iter().map(|(name, value)| (*name, value)))?;

        writeln!(
            self.out,
            "Log records from the iteration {}:",
            log.status.iterations_done
        )?;
        if let Some(row) = log.peek_current_row() {
            self.print_attributes(row.attributes())?;
        }
        self.out.flush()
    }
}

impl<B> Action<B> for Printing {
    fn name(&self) -> &str {
        "Printing"
    }

    fn perform(
        &mut self,
        which_callback: Callback,
        invocation: Invocation<'_, B>,
    ) -> Result<(), ExtensionError> {
        self.print_report(which_callback, invocation.log())?;
        Ok(())
    }
}

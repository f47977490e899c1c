use crate::model::transaction::Classification;

#[derive(Debug, Default, Eq, PartialEq)]
pub struct Stats {
    n_transactions: usize,
    n_ignored: usize,
    n_conversions: usize,
    n_lots_created: usize,
    n_spends: usize,
    n_emitted: usize,
    n_suppressed: usize,
    n_other: usize,
}

impl Stats {
    pub fn inc_transactions(&mut self) {
        self.n_transactions += 1;
    }

    /// Count a transaction by the way it was classified.
    pub fn record(&mut self, classification: &Classification) {
        match classification {
            Classification::Ignored => self.n_ignored += 1,
            Classification::Conversion { lot_created } => {
                self.n_conversions += 1;
                if *lot_created {
                    self.n_lots_created += 1;
                }
            }
            Classification::Spend { emitted, .. } => {
                self.n_spends += 1;
                if *emitted {
                    self.n_emitted += 1;
                } else {
                    self.n_suppressed += 1;
                }
            }
            Classification::Other => self.n_other += 1,
        }
    }

    pub fn transactions(&self) -> usize {
        self.n_transactions
    }

    pub fn emitted(&self) -> usize {
        self.n_emitted
    }

    pub fn pretty_print(&self) {
        println!("{self:#?}");
        println!();
    }
}

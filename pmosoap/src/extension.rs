//! Chaîne d'extensions autour de la sérialisation.
//!
//! Une extension peut réécrire les octets bruts de la requête ou de la
//! réponse et observe les quatre étapes du message. La chaîne est recréée à
//! chaque appel depuis les configurations du service et de la méthode, dans
//! cet ordre :
//!
//! 1. extensions de service du groupe prioritaire,
//! 2. extensions de la méthode,
//! 3. extensions de service du groupe secondaire.
//!
//! Dans un groupe, les extensions sont triées par `priority` croissante ; à
//! priorité égale l'ordre de déclaration est conservé.
//!
//! # Exemple
//!
//! ```ignore
//! use pmosoap::{ExtensionConfig, SoapExtension, CallMessage, SoapError};
//!
//! struct Trace;
//!
//! impl SoapExtension for Trace {
//!     fn process_message(&mut self, message: &mut CallMessage) -> Result<(), SoapError> {
//!         println!("{:?} {}", message.stage(), message.method().name);
//!         Ok(())
//!     }
//! }
//!
//! let config = ExtensionConfig::new(|_: &_| Box::new(Trace) as Box<dyn SoapExtension>);
//! ```

use crate::descriptor::MethodDescriptor;
use crate::error::Result;
use crate::message::{CallMessage, MessageStage};
use std::sync::Arc;
use tracing::trace;

/// Intercepteur d'un appel.
///
/// Chaque méthode laisse passer par défaut : une extension n'implémente que
/// ce dont elle a besoin.
pub trait SoapExtension: Send {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Notification d'étape ; `message.stage()` indique laquelle.
    fn process_message(&mut self, _message: &mut CallMessage) -> Result<()> {
        Ok(())
    }

    /// Réécrit la requête sérialisée avant l'extension suivante, vers le
    /// réseau.
    fn chain_request(&mut self, body: Vec<u8>) -> Result<Vec<u8>> {
        Ok(body)
    }

    /// Réécrit la réponse avant l'extension suivante, vers la lecture de
    /// l'enveloppe.
    fn chain_response(&mut self, body: Vec<u8>) -> Result<Vec<u8>> {
        Ok(body)
    }
}

/// Crée une instance d'extension neuve pour chaque appel.
pub trait ExtensionFactory: Send + Sync {
    fn create(&self, method: &MethodDescriptor) -> Box<dyn SoapExtension>;
}

impl<F> ExtensionFactory for F
where
    F: Fn(&MethodDescriptor) -> Box<dyn SoapExtension> + Send + Sync,
{
    fn create(&self, method: &MethodDescriptor) -> Box<dyn SoapExtension> {
        self(method)
    }
}

/// Groupe de priorité d'une extension de service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityGroup {
    /// Avant les extensions de la méthode
    #[default]
    High,
    /// Après les extensions de la méthode
    Low,
}

/// Extension déclarée : une fabrique et son rang.
#[derive(Clone)]
pub struct ExtensionConfig {
    factory: Arc<dyn ExtensionFactory>,
    pub priority: i32,
    pub group: PriorityGroup,
}

impl std::fmt::Debug for ExtensionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionConfig")
            .field("priority", &self.priority)
            .field("group", &self.group)
            .finish()
    }
}

impl ExtensionConfig {
    pub fn new(factory: impl ExtensionFactory + 'static) -> Self {
        Self {
            factory: Arc::new(factory),
            priority: 0,
            group: PriorityGroup::High,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn low_priority(mut self) -> Self {
        self.group = PriorityGroup::Low;
        self
    }

    pub fn is_high_priority(&self) -> bool {
        self.group == PriorityGroup::High
    }

    fn create(&self, method: &MethodDescriptor) -> Box<dyn SoapExtension> {
        self.factory.create(method)
    }
}

fn sorted(configs: &[ExtensionConfig]) -> Vec<&ExtensionConfig> {
    let mut configs: Vec<&ExtensionConfig> = configs.iter().collect();
    // tri stable : à priorité égale, l'ordre de déclaration est conservé
    configs.sort_by_key(|c| c.priority);
    configs
}

/// Extensions ordonnées d'un appel.
#[derive(Default)]
pub struct ExtensionChain {
    extensions: Vec<Box<dyn SoapExtension>>,
}

impl std::fmt::Debug for ExtensionChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionChain")
            .field("extensions", &self.names())
            .finish()
    }
}

impl ExtensionChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instancie la chaîne de `method` depuis les groupes du service et la
    /// configuration propre à la méthode.
    pub fn build(
        high_priority: &[ExtensionConfig],
        method: &MethodDescriptor,
        low_priority: &[ExtensionConfig],
    ) -> Self {
        let extensions = sorted(high_priority)
            .into_iter()
            .chain(sorted(&method.extensions))
            .chain(sorted(low_priority))
            .map(|config| config.create(method))
            .collect();
        Self { extensions }
    }

    pub fn push(&mut self, extension: Box<dyn SoapExtension>) {
        self.extensions.push(extension);
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    /// Notifie chaque extension, dans l'ordre de la chaîne, de l'étape
    /// courante du message. La première erreur interrompt l'appel.
    pub fn process(&mut self, message: &mut CallMessage) -> Result<()> {
        let stage: MessageStage = message.stage();
        for extension in self.extensions.iter_mut() {
            trace!(extension = extension.name(), ?stage, "Processing message");
            extension.process_message(message)?;
        }
        Ok(())
    }

    /// Fait passer la requête dans les extensions.
    ///
    /// La dernière extension enveloppe la sortie du sérialiseur : les
    /// octets vont de la fin de la chaîne vers la première extension, qui
    /// les remet au transport.
    pub fn chain_request(&mut self, body: Vec<u8>) -> Result<Vec<u8>> {
        self.extensions
            .iter_mut()
            .rev()
            .try_fold(body, |body, extension| extension.chain_request(body))
    }

    /// Fait passer la réponse dans les extensions, de la première (la plus
    /// proche du transport) à la dernière.
    pub fn chain_response(&mut self, body: Vec<u8>) -> Result<Vec<u8>> {
        self.extensions
            .iter_mut()
            .try_fold(body, |body, extension| extension.chain_response(body))
    }
}

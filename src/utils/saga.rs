//! Compensaciones para escrituras de varios pasos
//!
//! El almacenamiento no ofrece commits atómicos entre tablas, así que cada
//! paso exitoso registra la acción que lo deshace. Si un paso posterior
//! falla, las compensaciones se ejecutan en orden inverso.

use futures::future::BoxFuture;

use crate::utils::errors::AppResult;

type Compensation = Box<dyn FnOnce() -> BoxFuture<'static, AppResult<()>> + Send>;

pub struct Saga {
    operacion: &'static str,
    pasos: Vec<(&'static str, Compensation)>,
}

impl Saga {
    pub fn new(operacion: &'static str) -> Self {
        Self {
            operacion,
            pasos: Vec::new(),
        }
    }

    /// Registrar la compensación del paso que acaba de completarse
    pub fn push<F>(&mut self, descripcion: &'static str, compensacion: F)
    where
        F: FnOnce() -> BoxFuture<'static, AppResult<()>> + Send + 'static,
    {
        self.pasos.push((descripcion, Box::new(compensacion)));
    }

    /// Deshacer todos los pasos registrados, del último al primero.
    /// Devuelve cuántas compensaciones fallaron.
    pub async fn rollback(self) -> usize {
        log::warn!(
            "↩️ Revirtiendo '{}' ({} pasos a compensar)",
            self.operacion,
            self.pasos.len()
        );

        let mut fallidas = 0;
        for (descripcion, compensacion) in self.pasos.into_iter().rev() {
            match compensacion().await {
                Ok(()) => log::info!("↩️ Compensado: {}", descripcion),
                Err(e) => {
                    fallidas += 1;
                    log::error!("❌ Falló la compensación '{}' en '{}': {}", descripcion, self.operacion, e);
                }
            }
        }
        fallidas
    }

    /// Todos los pasos terminaron; las compensaciones se descartan.
    pub fn commit(self) {
        log::debug!("✅ '{}' confirmada ({} pasos)", self.operacion, self.pasos.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::AppError;
    use futures::FutureExt;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_rollback_runs_in_reverse_order() {
        let registro = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new("prueba");

        for paso in ["primero", "segundo", "tercero"] {
            let registro = registro.clone();
            saga.push(paso, move || {
                async move {
                    registro.lock().unwrap().push(paso);
                    Ok::<(), AppError>(())
                }
                .boxed()
            });
        }

        assert_eq!(saga.pasos.len(), 3);
        let fallidas = saga.rollback().await;

        assert_eq!(fallidas, 0);
        assert_eq!(*registro.lock().unwrap(), vec!["tercero", "segundo", "primero"]);
    }

    #[tokio::test]
    async fn test_rollback_continues_after_failed_compensation() {
        let registro = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new("prueba");

        let r = registro.clone();
        saga.push("base", move || {
            async move {
                r.lock().unwrap().push("base");
                Ok::<(), AppError>(())
            }
            .boxed()
        });
        saga.push("rota", || {
            async { Err::<(), AppError>(AppError::DatabaseError("sin conexión".to_string())) }.boxed()
        });

        let fallidas = saga.rollback().await;

        assert_eq!(fallidas, 1);
        assert_eq!(*registro.lock().unwrap(), vec!["base"]);
    }

    #[tokio::test]
    async fn test_commit_discards_compensations() {
        let registro = Arc::new(Mutex::new(Vec::<&str>::new()));
        let mut saga = Saga::new("prueba");
        let r = registro.clone();
        saga.push("nunca", move || {
            async move {
                r.lock().unwrap().push("nunca");
                Ok::<(), AppError>(())
            }
            .boxed()
        });

        saga.commit();
        assert!(registro.lock().unwrap().is_empty());
    }
}

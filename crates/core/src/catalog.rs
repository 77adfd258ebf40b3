//! The built-in maintenance actions.
//!
//! Each action is a [`Procedure`] variant; [`builtin`] registers all of them
//! with their display text in listing order.

use std::path::Path;

use log::{debug, info};
use tokio::time::sleep;

use crate::chain::{compose, ChainStep};
use crate::cleanup::{delete_tree, purge, thumbnail_cache_files, PurgePlan};
use crate::context::ActionContext;
use crate::error::Result;
use crate::log_sink::Severity;
use crate::memory;
use crate::registry::{ActionMetadata, ActionRegistry};

const RECYCLE_BIN_SCRIPT: &str = r#"-NoProfile -ExecutionPolicy Bypass -Command "try{Clear-RecycleBin -Force -ErrorAction Stop; 'OK'}catch{ 'WARN: ' + $_.Exception.Message }""#;

/// What an action does when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Procedure {
    FlushDns,
    ReleaseIp,
    RenewIp,
    ResetWinsock,
    ResetIpStack,
    NetworkRepairChain,
    NetworkDiagnostics,
    ResetProxy,
    PurgeTemp,
    DeepClean,
    EmptyRecycleBin,
    ResetIconCache,
    PurgeThumbnails,
    ResetWindowsUpdate,
    VerifySystemFiles,
    CheckDisk,
    CheckImageHealth,
    ReleaseMemory,
}

impl Procedure {
    /// Runs the procedure to completion.
    ///
    /// # Errors
    ///
    /// Returns the first invocation fault; command-level failures and
    /// filesystem errors are only logged.
    pub async fn run(self, context: &ActionContext) -> Result<()> {
        debug!("Running procedure {:?}", self);

        match self {
            Procedure::FlushDns => {
                ChainStep::new("ipconfig.exe", "/flushdns", "Executando ipconfig /flushdns...")
                    .run(context)
                    .await?;
            }
            Procedure::ReleaseIp => {
                ChainStep::new("ipconfig.exe", "/release", "Executando ipconfig /release...")
                    .starting_at(Severity::Warn)
                    .finishing_with("Release concluido.")
                    .run(context)
                    .await?;
            }
            Procedure::RenewIp => {
                ChainStep::new("ipconfig.exe", "/renew", "Executando ipconfig /renew...")
                    .starting_at(Severity::Warn)
                    .finishing_with("Renew concluido.")
                    .run(context)
                    .await?;
            }
            Procedure::ResetWinsock => {
                ChainStep::new("netsh.exe", "winsock reset", "Executando netsh winsock reset...")
                    .finishing_with("Reset Winsock concluido.")
                    .run(context)
                    .await?;
            }
            Procedure::ResetIpStack => {
                ChainStep::new("netsh.exe", "int ip reset", "Executando netsh int ip reset...")
                    .finishing_with("Reset do protocolo IP concluido.")
                    .run(context)
                    .await?;
            }
            Procedure::NetworkRepairChain => network_repair_chain(context).await?,
            Procedure::NetworkDiagnostics => {
                ChainStep::new("ipconfig.exe", "/all", "Coletando diagnostico de rede...")
                    .run(context)
                    .await?;
            }
            Procedure::ResetProxy => {
                ChainStep::new("netsh.exe", "winhttp reset proxy", "Executando reset de proxy...")
                    .run(context)
                    .await?;
            }
            Procedure::PurgeTemp => purge_temp(context).await,
            Procedure::DeepClean => deep_clean(context).await?,
            Procedure::EmptyRecycleBin => empty_recycle_bin(context).await?,
            Procedure::ResetIconCache => reset_icon_cache(context).await?,
            Procedure::PurgeThumbnails => purge_thumbnails(context).await,
            Procedure::ResetWindowsUpdate => reset_windows_update(context).await?,
            Procedure::VerifySystemFiles => {
                ChainStep::new("sfc.exe", "/scannow", "Iniciando sfc /scannow (pode demorar)...")
                    .starting_at(Severity::Warn)
                    .finishing_with("SFC concluido.")
                    .run(context)
                    .await?;
            }
            Procedure::CheckDisk => {
                ChainStep::new("chkdsk.exe", "C:", "Executando chkdsk C: (somente leitura)...")
                    .finishing_with("CHKDSK concluido.")
                    .run(context)
                    .await?;
            }
            Procedure::CheckImageHealth => {
                ChainStep::new(
                    "dism.exe",
                    "/Online /Cleanup-Image /CheckHealth",
                    "Executando DISM CheckHealth...",
                )
                .finishing_with("DISM CheckHealth concluido.")
                .run(context)
                .await?;
            }
            Procedure::ReleaseMemory => release_memory(context).await,
        }

        Ok(())
    }
}

/// Flush DNS, release, renew, Winsock reset and IP reset, always in that order.
pub fn network_repair_steps() -> Vec<ChainStep> {
    vec![
        ChainStep::new("ipconfig.exe", "/flushdns", "1/5 - Flush DNS"),
        ChainStep::new("ipconfig.exe", "/release", "2/5 - Release IP").starting_at(Severity::Warn),
        ChainStep::new("ipconfig.exe", "/renew", "3/5 - Renew IP").starting_at(Severity::Warn),
        ChainStep::new("netsh.exe", "winsock reset", "4/5 - Reset Winsock")
            .starting_at(Severity::Warn),
        ChainStep::new("netsh.exe", "int ip reset", "5/5 - Reset Protocolo IP")
            .starting_at(Severity::Warn),
    ]
}

async fn network_repair_chain(context: &ActionContext) -> Result<()> {
    context.log.warn("Iniciando cadeia de comandos de rede...");
    compose(network_repair_steps()).run(context).await?;
    context
        .log
        .ok("Cadeia de rede concluida. Reinicie o computador se solicitado.");
    Ok(())
}

fn purge_step(directory: &str, label: String) -> ChainStep {
    ChainStep::new("cmd.exe", format!("/c del /s /f /q \"{directory}\\*.*\""), label)
}

async fn deep_clean(context: &ActionContext) -> Result<()> {
    let paths = &context.settings.paths;
    let system_temp = paths.system_temp().display().to_string();
    let prefetch = paths.prefetch().display().to_string();

    context.log.warn("Iniciando limpeza de TEMP e Prefetch...");
    compose(vec![
        // `%temp%` is expanded by cmd itself, in the user's own environment.
        purge_step("%temp%", "1/3 - Limpando %temp%...".to_string()),
        purge_step(&system_temp, format!("2/3 - Limpando {system_temp}...")),
        purge_step(&prefetch, format!("3/3 - Limpando {prefetch}...")),
    ])
    .run(context)
    .await?;
    context.log.ok("Limpeza Temp/Prefetch concluida.");
    Ok(())
}

async fn purge_temp(context: &ActionContext) {
    let temp = &context.settings.paths.user_temp;
    context
        .log
        .info(format!("Processando: {}", temp.display()));

    let plan = match PurgePlan::for_directory(temp) {
        Ok(plan) => plan,
        Err(e) => {
            context
                .log
                .warn(format!("Nao foi possivel listar {}: {e}", temp.display()));
            return;
        }
    };

    context.log.info(format!("{} itens encontrados.", plan.entries()));
    let report = purge(plan, context.settings.progress_batch_size, |progress| {
        context.log.info(format!(
            "{}/{} processados...",
            progress.processed, progress.total
        ));
    })
    .await;

    info!("Temp purge finished: {:?}", report);
    context.log.info(format!(
        "{} remocoes tentadas, {} concluidas.",
        report.attempted, report.deleted
    ));
    if !report.is_clean() {
        context.log.warn(format!(
            "{} de {} remocoes ignoradas (em uso ou sem permissao).",
            report.failed, report.attempted
        ));
    }
    context.log.ok("Limpeza concluida.");
}

async fn empty_recycle_bin(context: &ActionContext) -> Result<()> {
    context.log.info("Esvaziando Lixeira...");
    let result = context
        .invoker
        .invoke_capture("powershell.exe", RECYCLE_BIN_SCRIPT)
        .await?;

    let severity = if result.output.starts_with("OK") {
        Severity::Ok
    } else {
        Severity::Warn
    };
    context.log.append(result.output.trim(), severity);
    Ok(())
}

async fn reset_icon_cache(context: &ActionContext) -> Result<()> {
    context.log.info("Limpando cache via ie4uinit...");
    context
        .invoker
        .invoke_fire_and_forget("ie4uinit.exe", "-ClearIconCache")
        .await?;

    context.log.warn("Reiniciando Explorer...");
    if let Err(e) = context
        .invoker
        .invoke_fire_and_forget("taskkill.exe", "/F /IM explorer.exe")
        .await
    {
        context
            .log
            .warn(format!("Nao foi possivel encerrar o Explorer: {e}"));
    }
    sleep(context.settings.shell_settle_delay).await;

    context.invoker.spawn_detached("explorer.exe", "").await?;
    context.log.ok("Cache limpo. Explorer reiniciado.");
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

async fn purge_thumbnails(context: &ActionContext) {
    let Some(directory) = context
        .settings
        .paths
        .explorer_cache
        .as_deref()
        .filter(|directory| directory.is_dir())
    else {
        context.log.warn("Pasta de miniaturas nao encontrada.");
        return;
    };

    let files = match thumbnail_cache_files(directory) {
        Ok(files) => files,
        Err(e) => {
            context
                .log
                .warn(format!("Nao foi possivel listar {}: {e}", directory.display()));
            return;
        }
    };
    context
        .log
        .info(format!("{} arquivo(s) encontrado(s).", files.len()));

    let mut removed = 0;
    for file in &files {
        if delete_tree(file).is_complete() {
            removed += 1;
            context.log.info(format!("Removido: {}", file_name(file)));
        } else {
            context
                .log
                .warn(format!("Em uso, ignorado: {}", file_name(file)));
        }
        tokio::task::yield_now().await;
    }

    context
        .log
        .ok(format!("{removed} arquivo(s) removido(s)."));
}

async fn reset_windows_update(context: &ActionContext) -> Result<()> {
    context.log.info("Parando wuauserv...");
    context
        .invoker
        .invoke_fire_and_forget("sc.exe", "stop wuauserv")
        .await?;
    sleep(context.settings.service_settle_delay).await;

    let cache = context.settings.paths.update_cache();
    context.log.info("Limpando SoftwareDistribution...");
    if cache.is_dir() {
        match PurgePlan::for_directory(&cache) {
            Ok(plan) => {
                let report = purge(plan, context.settings.progress_batch_size, |_| {}).await;
                info!("Update cache purge finished: {:?}", report);
                if !report.is_clean() {
                    context.log.warn(format!(
                        "{} de {} remocoes ignoradas (em uso ou sem permissao).",
                        report.failed, report.attempted
                    ));
                }
            }
            Err(e) => context
                .log
                .warn(format!("Nao foi possivel listar {}: {e}", cache.display())),
        }
    }

    context.log.info("Iniciando wuauserv...");
    context
        .invoker
        .invoke_fire_and_forget("sc.exe", "start wuauserv")
        .await?;
    context.log.ok("Windows Update resetado.");
    Ok(())
}

async fn release_memory(context: &ActionContext) {
    context.log.info("Liberando memoria do processo...");
    if memory::trim_working_set() {
        context.log.info("Working set do processo reduzido.");
    } else {
        context
            .log
            .warn("Reducao do working set nao suportada neste sistema.");
    }
    sleep(context.settings.memory_settle_delay).await;
    context.log.ok("Coleta concluida.");
}

const fn metadata(
    title: &'static str,
    subtitle: &'static str,
    description: &'static str,
) -> ActionMetadata {
    ActionMetadata {
        title,
        subtitle,
        description,
    }
}

/// Every built-in action, in listing order.
pub const BUILTIN: [(&str, ActionMetadata, Procedure); 18] = [
    (
        "dns",
        metadata(
            "Flush DNS",
            "Limpa o cache de resolucao de nomes de dominio.",
            "Executa ipconfig /flushdns para reiniciar o cache DNS do sistema.",
        ),
        Procedure::FlushDns,
    ),
    (
        "release",
        metadata(
            "Release IP",
            "Libera o endereco IP atual do adaptador de rede.",
            "Executa ipconfig /release para soltar a concessao DHCP atual.",
        ),
        Procedure::ReleaseIp,
    ),
    (
        "renew",
        metadata(
            "Renew IP",
            "Solicita um novo endereco IP ao DHCP.",
            "Executa ipconfig /renew para renovar a configuracao de rede.",
        ),
        Procedure::RenewIp,
    ),
    (
        "winsock",
        metadata(
            "Reset Winsock",
            "Redefine o catalogo Winsock.",
            "Executa netsh winsock reset. Reinicio do sistema pode ser necessario.",
        ),
        Procedure::ResetWinsock,
    ),
    (
        "ipreset",
        metadata(
            "Reset Protocolo IP",
            "Reseta parametros TCP/IP da pilha de rede.",
            "Executa netsh int ip reset. Reinicio do sistema pode ser necessario.",
        ),
        Procedure::ResetIpStack,
    ),
    (
        "netchain",
        metadata(
            "Executar Cadeia de Rede",
            "Aplica os principais comandos de reparo em sequencia.",
            "Executa: flushdns, release, renew, winsock reset e int ip reset.",
        ),
        Procedure::NetworkRepairChain,
    ),
    (
        "netinfo",
        metadata(
            "Diagnostico de Rede (ipconfig /all)",
            "Mostra configuracoes completas dos adaptadores.",
            "Executa ipconfig /all e registra a saida no log.",
        ),
        Procedure::NetworkDiagnostics,
    ),
    (
        "proxy",
        metadata(
            "Resetar Proxy WinHTTP",
            "Remove configuracao de proxy da pilha WinHTTP.",
            "Executa netsh winhttp reset proxy.",
        ),
        Procedure::ResetProxy,
    ),
    (
        "temp",
        metadata(
            "Arquivos Temporarios",
            "Remove arquivos residuais da pasta TEMP.",
            "Exclui arquivos temporarios (ignora os que estiverem em uso).",
        ),
        Procedure::PurgeTemp,
    ),
    (
        "deepclean",
        metadata(
            "Limpeza Temp + Prefetch",
            "Limpa TEMP do usuario, Windows Temp e Prefetch.",
            "Executa em cadeia: del /s /f /q em %temp%, Windows\\Temp e Windows\\Prefetch.",
        ),
        Procedure::DeepClean,
    ),
    (
        "lixo",
        metadata(
            "Esvaziar Lixeira",
            "Remove permanentemente os arquivos na Lixeira.",
            "Usa o PowerShell Clear-RecycleBin (se falhar, registra aviso).",
        ),
        Procedure::EmptyRecycleBin,
    ),
    (
        "icone",
        metadata(
            "Cache de Icones",
            "Redefine o banco de dados de icones do Windows.",
            "Limpa icon cache (ie4uinit) e reinicia o Explorer.",
        ),
        Procedure::ResetIconCache,
    ),
    (
        "mini",
        metadata(
            "Cache de Miniaturas",
            "Remove arquivos de pre-visualizacao armazenados.",
            "Deleta thumbcache_*.db da pasta do Explorer (ignora arquivos em uso).",
        ),
        Procedure::PurgeThumbnails,
    ),
    (
        "wu",
        metadata(
            "Resetar Windows Update",
            "Reinicia servicos e limpa cache do Windows Update.",
            "Para wuauserv, limpa SoftwareDistribution e inicia o servico.",
        ),
        Procedure::ResetWindowsUpdate,
    ),
    (
        "sfc",
        metadata(
            "Verificar Arquivos SFC",
            "Verifica e repara arquivos de sistema corrompidos.",
            "Executa sfc /scannow e registra a saida.",
        ),
        Procedure::VerifySystemFiles,
    ),
    (
        "disk",
        metadata(
            "CHKDSK Somente Leitura",
            "Analisa integridade do disco C: sem alteracoes.",
            "Executa chkdsk C: (modo leitura) e registra a saida.",
        ),
        Procedure::CheckDisk,
    ),
    (
        "dism",
        metadata(
            "DISM CheckHealth",
            "Verifica estado da imagem do Windows (rapido).",
            "Executa DISM /Online /Cleanup-Image /CheckHealth.",
        ),
        Procedure::CheckImageHealth,
    ),
    (
        "mem",
        metadata(
            "Liberar Memoria",
            "Reduz o working set deste processo.",
            "Pede ao sistema para devolver as paginas ociosas do processo.",
        ),
        Procedure::ReleaseMemory,
    ),
];

/// Builds the registry of built-in actions.
///
/// # Errors
///
/// Returns an error if the built-in table has a malformed or duplicate
/// identifier; hosts treat this as fatal at start-up.
pub fn builtin() -> Result<ActionRegistry> {
    let mut registry = ActionRegistry::new();
    for (id, metadata, procedure) in BUILTIN {
        registry.register(id, metadata, procedure)?;
    }
    Ok(registry)
}
